//! Name filtering over a resolved registry

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tests::fixtures::descriptor;
use tests::MockSource;
use velvet_core::{ConnectorRegistry, ConnectorSource, SourceKind, Theme};

async fn resolved_registry() -> ConnectorRegistry {
    let injected: Arc<dyn ConnectorSource> = MockSource::new(
        SourceKind::Injected,
        Duration::ZERO,
        vec![
            descriptor("argentX", "Argent X", SourceKind::Injected),
            descriptor("braavos", "Braavos", SourceKind::Injected),
        ],
    );
    let predeployed: Arc<dyn ConnectorSource> = MockSource::new(
        SourceKind::Predeployed,
        Duration::ZERO,
        vec![
            descriptor("katana-0", "Katana 0", SourceKind::Predeployed),
            descriptor("katana-1", "Katana 1", SourceKind::Predeployed),
        ],
    );
    let registry = ConnectorRegistry::new(vec![injected, predeployed]);
    registry.refresh().await;
    registry
}

fn ids(entries: &[velvet_core::ConnectorDescriptor]) -> Vec<&str> {
    entries.iter().map(|d| d.id.as_str()).collect()
}

#[tokio::test]
async fn test_empty_query_returns_every_entry_in_order() {
    let registry = resolved_registry().await;
    let all = registry.filter("").await;
    assert_eq!(ids(&all), registry.snapshot().await.ids());
    assert_eq!(ids(&all), vec!["argentX", "braavos", "katana-0", "katana-1"]);
}

#[tokio::test]
async fn test_query_is_case_insensitive_substring() {
    let registry = resolved_registry().await;
    assert_eq!(ids(&registry.filter("KATANA").await), vec!["katana-0", "katana-1"]);
    assert_eq!(ids(&registry.filter("av").await), vec!["braavos"]);
    assert_eq!(ids(&registry.filter("t x").await), vec!["argentX"]);
}

#[tokio::test]
async fn test_filter_result_is_a_subset_preserving_order() {
    let registry = resolved_registry().await;
    let all = ids(&registry.filter("").await)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    for query in ["a", "r", "1", "zzz"] {
        let narrowed = registry.filter(query).await;
        let positions: Vec<usize> = narrowed
            .iter()
            .map(|d| all.iter().position(|id| *id == d.id).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted, "query {:?}", query);
    }
    assert!(registry.filter("zzz").await.is_empty());
}

#[tokio::test]
async fn test_views_resolve_icons_for_theme() {
    let registry = resolved_registry().await;
    let views = registry.snapshot().await.views(Theme::Light);
    assert_eq!(views.len(), 4);
    assert_eq!(views[0].id, "argentX");
    assert_eq!(views[0].icon, "/wallets/argentX.svg");
    assert!(views.iter().all(|v| v.available));
}
