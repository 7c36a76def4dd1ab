mod common;

use common::{seed_world, setup_test_db};
use pirdesk::auth::password::{hash_password, verify_password};
use pirdesk::auth::permissions::codes_for_role;
use pirdesk::auth::session::Permissions;
use pirdesk::models::{company, user};

#[test]
fn password_hash_round_trip() {
    let hash = hash_password("Password1!").expect("hash");
    assert_ne!(hash, "Password1!");
    assert!(verify_password("Password1!", &hash).expect("verify"));
    assert!(!verify_password("wrong", &hash).expect("verify"));
}

#[test]
fn hashes_are_salted() {
    let a = hash_password("Password1!").expect("hash");
    let b = hash_password("Password1!").expect("hash");
    assert_ne!(a, b);
}

#[test]
fn roles_map_to_permission_codes() {
    let admin = codes_for_role("admin");
    assert!(admin.contains(&"questions.manage"));
    assert!(admin.contains(&"pir.review"));

    let editor = codes_for_role("editor");
    assert!(editor.contains(&"pir.respond"));
    assert!(!editor.contains(&"questions.manage"));

    let viewer = codes_for_role("viewer");
    assert_eq!(viewer, vec!["pir.view"]);

    // Unknown roles degrade to view + comment.
    let other = codes_for_role("auditor");
    assert!(other.contains(&"pir.view"));
    assert!(!other.contains(&"pir.respond"));
}

#[test]
fn permissions_parse_from_csv() {
    let perms = Permissions::from_csv("pir.view, pir.respond ,,comments.post");
    assert!(perms.has("pir.view"));
    assert!(perms.has("pir.respond"));
    assert!(perms.has("comments.post"));
    assert!(!perms.has("pir.review"));
    assert!(!perms.has(""));
}

#[test]
fn membership_resolves_company_and_role() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);

    let membership = company::membership_of(&conn, world.customer_user).unwrap().unwrap();
    assert_eq!(membership.company_id, world.customer_id);
    assert_eq!(membership.company_name, "Acme Manufacturing");
    assert_eq!(membership.role, "editor");

    assert!(company::membership_of(&conn, 999_999).unwrap().is_none());
}

#[test]
fn relationship_is_directional() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);

    assert!(company::has_relationship(&conn, world.customer_id, world.supplier_id).unwrap());
    assert!(!company::has_relationship(&conn, world.supplier_id, world.customer_id).unwrap());

    let suppliers = company::suppliers_of(&conn, world.customer_id).unwrap();
    assert_eq!(suppliers.len(), 1);
    assert_eq!(suppliers[0].name, "Globex Materials");
}

#[test]
fn usernames_are_unique() {
    let (_dir, conn) = setup_test_db();
    let world = seed_world(&conn);
    let existing = user::find_by_username(&conn, "alice").unwrap().unwrap();
    assert_eq!(existing.id, world.customer_user);

    let duplicate = user::create(
        &conn,
        &user::NewUser {
            username: "alice".to_string(),
            password: "x".to_string(),
            email: "other@test.com".to_string(),
            display_name: "Other Alice".to_string(),
        },
    );
    assert!(duplicate.is_err());
}
