// Session-token behavior as seen from outside the crate.
use lingkungan_api::auth::{generate_jwt, validate_jwt, Claims};
use lingkungan_api::types::Role;
use uuid::Uuid;

#[test]
fn every_role_survives_a_token_round_trip() {
    for role in Role::ALL {
        let user_id = Uuid::new_v4();
        let token = generate_jwt(Claims::new(user_id, role)).expect("token");
        let claims = validate_jwt(&token).expect("claims");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role(), Some(role), "{:?}", role);
    }
}

#[test]
fn tampered_tokens_are_treated_as_anonymous() {
    let token = generate_jwt(Claims::new(Uuid::new_v4(), Role::Umat)).expect("token");
    let mut tampered = token.clone();
    tampered.push('x');
    assert!(validate_jwt(&tampered).is_none());
    assert!(validate_jwt("").is_none());
    assert!(validate_jwt("a.b.c").is_none());
}

#[test]
fn claims_with_an_unknown_role_resolve_to_none() {
    let mut claims = Claims::new(Uuid::new_v4(), Role::Umat);
    claims.role = "PENGURUS".to_string();
    assert_eq!(claims.role(), None);
}
