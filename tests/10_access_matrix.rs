// Page-access matrix exercised through the public decision function.
use lingkungan_api::middleware::decide;
use lingkungan_api::middleware::AccessDecision::{Allow, RedirectDashboard, RedirectLogin};
use lingkungan_api::types::Role;

fn allowed(path: &str, role: Role) -> bool {
    decide(path, Some(role)) == Allow
}

#[test]
fn dashboard_admits_every_role() {
    for role in Role::ALL {
        assert!(allowed("/dashboard", role), "{:?} locked out of dashboard", role);
    }
}

#[test]
fn treasury_pages_admit_only_treasury_and_super_user() {
    let treasury = [Role::SuperUser, Role::Bendahara, Role::WakilBendahara];
    for path in ["/lingkungan", "/lingkungan/kas", "/ikata", "/ikata/monitoring", "/approval"] {
        for role in Role::ALL {
            assert_eq!(
                allowed(path, role),
                treasury.contains(&role),
                "{:?} on {}",
                role,
                path
            );
        }
    }
}

#[test]
fn member_registry_pages_admit_the_secretariat() {
    let secretariat = [
        Role::SuperUser,
        Role::Ketua,
        Role::WakilKetua,
        Role::Sekretaris,
        Role::WakilSekretaris,
    ];
    for path in ["/kesekretariatan/umat", "/kesekretariatan/doling"] {
        for role in Role::ALL {
            assert_eq!(allowed(path, role), secretariat.contains(&role), "{:?} on {}", role, path);
        }
    }
}

#[test]
fn kaleidoskop_page_is_narrower_than_its_parent() {
    // Parent section is open to everyone, the yearly overview is not.
    assert!(allowed("/kesekretariatan", Role::Ketua));
    assert!(!allowed("/kesekretariatan/kaleidoskop", Role::Ketua));
    assert!(allowed("/kesekretariatan/kaleidoskop", Role::Sekretaris));
    assert!(allowed("/kesekretariatan/kaleidoskop", Role::WakilSekretaris));
    assert!(allowed("/kesekretariatan/kaleidoskop", Role::SuperUser));
}

#[test]
fn birthday_page_excludes_plain_members() {
    for role in Role::ALL {
        assert_eq!(allowed("/kesekretariatan/ulang-tahun", role), role != Role::Umat);
    }
}

#[test]
fn payment_history_is_for_members_and_super_user() {
    for role in Role::ALL {
        let expected = matches!(role, Role::SuperUser | Role::Umat);
        assert_eq!(allowed("/histori-pembayaran", role), expected, "{:?}", role);
    }
}

#[test]
fn profile_settings_are_for_members_and_super_user() {
    for role in Role::ALL {
        let expected = matches!(role, Role::SuperUser | Role::Umat);
        assert_eq!(allowed("/pengaturan/profil", role), expected, "{:?}", role);
    }
    // The password page underneath the same section stays open to all.
    for role in Role::ALL {
        assert!(allowed("/pengaturan/password", role));
    }
}

#[test]
fn deep_paths_resolve_to_the_most_specific_entry() {
    assert!(!allowed("/pengaturan/wipe/confirm", Role::Umat));
    assert!(allowed("/pengaturan/wipe/confirm", Role::SuperUser));
    assert!(!allowed("/lingkungan/kas/export/2025", Role::Sekretaris));
    assert!(allowed("/lingkungan/kas/export/2025", Role::Bendahara));
}

#[test]
fn anonymous_requests_redirect_to_login_on_protected_pages() {
    for path in ["/dashboard", "/approval", "/kesekretariatan/doling", "/notifications/abc"] {
        assert_eq!(decide(path, None), RedirectLogin, "{}", path);
    }
}

#[test]
fn authenticated_users_bounce_off_public_pages() {
    for path in ["/login", "/register", "/forgot-password", "/verify"] {
        assert_eq!(decide(path, None), Allow, "{}", path);
        assert_eq!(decide(path, Some(Role::Umat)), RedirectDashboard, "{}", path);
    }
}

#[test]
fn trailing_slashes_do_not_change_the_decision() {
    for role in Role::ALL {
        assert_eq!(decide("/approval/", Some(role)), decide("/approval", Some(role)));
    }
}

#[test]
fn api_and_assets_bypass_the_table() {
    assert_eq!(decide("/api/doling", None), Allow);
    assert_eq!(decide("/favicon.ico", None), Allow);
    assert_eq!(decide("/_next/static/chunk.js", None), Allow);
}
