//! Property-based tests for domain validation and the layout and theme
//! consumers

use fuzzwatch_client::consumers::{LayoutState, ThemeState, MOBILE_BREAKPOINT};
use fuzzwatch_client::{is_valid_domain, normalize_domain, validate_new_domain, Origin};
use fuzzwatch_core::{ClientError, ManualClock, SidebarMode};
use fuzzwatch_test_utils::generators::{arb_domain_name, arb_theme};
use fuzzwatch_test_utils::MockTransport;
use proptest::prelude::*;

fn origin() -> Origin {
    Origin::in_memory(
        MockTransport::new().shared(),
        ManualClock::starting_now().shared(),
    )
}

proptest! {
    #[test]
    fn prop_decorated_domain_normalizes_to_host(
        domain in arb_domain_name(),
        scheme in prop::sample::select(vec!["", "http://", "https://", "HTTPS://www."]),
        path in "(/[a-z0-9]{0,8}){0,2}",
    ) {
        prop_assume!(!domain.starts_with("www."));
        let input = format!("{}{}{}", scheme, domain, path);
        prop_assert_eq!(normalize_domain(&input).unwrap(), domain.clone());
        prop_assert!(is_valid_domain(&input));
        prop_assert_eq!(validate_new_domain(&input, &[]).unwrap(), domain);
    }

    #[test]
    fn prop_known_root_is_rejected(domain in arb_domain_name()) {
        prop_assume!(!domain.starts_with("www."));
        let known = vec![domain.clone()];
        let rejected = matches!(
            validate_new_domain(&domain, &known),
            Err(ClientError::Validation { .. })
        );
        prop_assert!(rejected);
    }

    #[test]
    fn prop_dotless_name_is_invalid(name in "[a-z0-9-]{1,24}") {
        prop_assert!(!is_valid_domain(&name));
        prop_assert!(validate_new_domain(&name, &[]).is_err());
    }

    #[test]
    fn prop_layout_margin_follows_mode(
        viewport in 0u32..2000,
        expanded in any::<bool>(),
        horizontal in any::<bool>(),
    ) {
        let tab = origin().open_tab();
        tab.store().set_sidebar_expanded(expanded).unwrap();
        tab.store().set_horizontal_sidebar(horizontal).unwrap();
        let layout = LayoutState::new(&tab, viewport).snapshot();

        if viewport < MOBILE_BREAKPOINT {
            prop_assert_eq!(layout.mode, SidebarMode::Horizontal);
            prop_assert_eq!(layout.sidebar_width, 0);
        }
        match layout.mode {
            SidebarMode::Horizontal => {
                prop_assert_eq!(layout.content_margin_left, 0);
            }
            SidebarMode::Floating => {
                prop_assert_eq!(layout.content_margin_left, layout.sidebar_width);
            }
        }
    }

    #[test]
    fn prop_sibling_theme_tracks_last_set(themes in prop::collection::vec(arb_theme(), 1..6)) {
        let tab = origin().open_tab();
        let setter = ThemeState::new(&tab);
        let sibling = ThemeState::new(&tab);
        for theme in &themes {
            setter.set_theme(*theme).unwrap();
        }
        let last = *themes.last().unwrap();
        prop_assert_eq!(sibling.theme(), last);
        prop_assert_eq!(tab.store().theme(), last);
    }
}
