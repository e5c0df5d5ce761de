//! Integration tests for NetworkRegistry: hierarchy, relationship graph and their lockstep.

use std::collections::BTreeSet;

use rstest::{fixture, rstest};

use socialtree::application::services::{LexiconAnalyzer, NetworkRegistry, SentimentScorer};
use socialtree::domain::{DomainError, InsertOutcome, ProfileUpdate};

/// Ana
/// ├── Bruno
/// │   ├── Carla
/// │   └── Davi
/// └── Eva
#[fixture]
fn family() -> NetworkRegistry {
    let mut registry = NetworkRegistry::new();
    registry.insert("Ana", None).unwrap();
    registry.insert("Bruno", Some("Ana")).unwrap();
    registry.insert("Carla", Some("Bruno")).unwrap();
    registry.insert("Davi", Some("Bruno")).unwrap();
    registry.insert("Eva", Some("Ana")).unwrap();
    registry
}

fn assert_consistent(registry: &NetworkRegistry) {
    let users: BTreeSet<&str> = registry.names();
    assert_eq!(users, registry.graph().nodes(), "users and graph diverged");
    assert_eq!(
        users,
        registry.tree().names_iter().collect::<BTreeSet<_>>(),
        "users and tree diverged"
    );
    assert!(registry.check_consistency().is_ok());
}

// ============================================================
// Basic scenarios
// ============================================================

#[test]
fn given_parent_and_child_when_searching_then_links_are_visible_both_ways() {
    let mut registry = NetworkRegistry::new();
    registry.insert("Ana", None).unwrap();
    registry.insert("Bruno", Some("Ana")).unwrap();

    let bruno = registry.search("Bruno").unwrap();
    let ana = registry.search("Ana").unwrap();

    assert_eq!(bruno.parent.as_deref(), Some("Ana"));
    assert_eq!(ana.children, vec!["Bruno".to_string()]);
    assert!(registry.graph().has_edge("Ana", "Bruno"));
}

#[test]
fn given_chain_when_removing_middle_then_grandchild_moves_up() {
    let mut registry = NetworkRegistry::new();
    registry.insert("Ana", None).unwrap();
    registry.insert("Bruno", Some("Ana")).unwrap();
    registry.insert("Carla", Some("Bruno")).unwrap();

    registry.remove("Bruno").unwrap();

    assert_eq!(
        registry.search("Carla").unwrap().parent.as_deref(),
        Some("Ana")
    );
    // the graph only loses Bruno's edges, no new edge is invented
    assert!(!registry.graph().has_edge("Ana", "Carla"));
    assert_consistent(&registry);
}

#[test]
fn given_existing_user_when_inserting_again_then_duplicate_is_rejected() {
    let mut registry = NetworkRegistry::new();
    registry.insert("Ana", None).unwrap();

    let err = registry.insert("Ana", None).unwrap_err();

    assert_eq!(err, DomainError::DuplicateUser("Ana".to_string()));
    assert_eq!(registry.len(), 1);
    assert_consistent(&registry);
}

#[test]
fn given_opposing_interactions_when_scoring_then_mean_is_strictly_inside_bounds() {
    let mut registry = NetworkRegistry::new();
    registry.insert("Ana", None).unwrap();
    registry.add_interaction("Ana", "I love this").unwrap();
    registry.add_interaction("Ana", "I hate that").unwrap();
    let scorer = SentimentScorer::new(LexiconAnalyzer::new());

    let score = registry.score_user("Ana", &scorer).unwrap();

    assert!(score > -1.0 && score < 1.0, "score {score} out of range");
}

#[test]
fn given_empty_registry_when_rendering_then_reports_empty_network() {
    let registry = NetworkRegistry::new();

    let err = registry.render_tree().unwrap_err();

    assert_eq!(err, DomainError::EmptyNetwork);
}

// ============================================================
// Insert fallbacks
// ============================================================

#[test]
fn given_unknown_parent_when_inserting_then_user_is_root_and_warning_returned() {
    let mut registry = NetworkRegistry::new();
    registry.insert("Ana", None).unwrap();

    let outcome = registry.insert("Bruno", Some("Zoe")).unwrap();

    assert_eq!(
        outcome,
        InsertOutcome::Fallback {
            reason: DomainError::UnknownParent("Zoe".to_string())
        }
    );
    assert!(registry.tree().is_root("Bruno"));
    assert_eq!(registry.graph().edge_count(), 0);
    assert_consistent(&registry);
}

// ============================================================
// Removal laws
// ============================================================

#[rstest]
fn given_inner_node_when_removed_then_children_join_grandparent(mut family: NetworkRegistry) {
    let removal = family.remove("Bruno").unwrap();

    assert_eq!(removal.former_parent.as_deref(), Some("Ana"));
    assert_eq!(removal.relocated, vec!["Carla".to_string(), "Davi".to_string()]);
    for child in ["Carla", "Davi"] {
        assert_eq!(family.tree().parent_of(child), Some("Ana"));
    }
    let ana_children: BTreeSet<&str> = family.tree().children_of("Ana").into_iter().collect();
    assert_eq!(ana_children, BTreeSet::from(["Carla", "Davi", "Eva"]));
    assert_consistent(&family);
}

#[rstest]
fn given_root_when_removed_then_children_become_roots(mut family: NetworkRegistry) {
    family.remove("Ana").unwrap();

    assert_eq!(family.tree().roots(), vec!["Bruno", "Eva"]);
    assert_eq!(family.tree().parent_of("Bruno"), None);
    assert_eq!(family.tree().parent_of("Eva"), None);
    assert_eq!(family.tree().parent_of("Carla"), Some("Bruno"));
    assert_eq!(family.render_tree().unwrap().root_count(), 2);
    assert_consistent(&family);
}

#[rstest]
fn given_leaf_when_removed_then_graph_loses_its_edge(mut family: NetworkRegistry) {
    family.remove("Eva").unwrap();

    assert!(!family.graph().contains("Eva"));
    assert_eq!(family.graph().edge_count(), 3);
    assert_consistent(&family);
}

#[rstest]
#[case("Zoe")]
#[case("")]
fn given_unknown_name_when_removing_then_nothing_changes(
    mut family: NetworkRegistry,
    #[case] name: &str,
) {
    let before = family.search("Bruno").unwrap();

    let err = family.remove(name).unwrap_err();

    assert_eq!(err, DomainError::UnknownUser(name.to_string()));
    assert_eq!(family.len(), 5);
    assert_eq!(family.search("Bruno").unwrap(), before);
}

// ============================================================
// Search and rendering
// ============================================================

#[rstest]
fn given_no_mutation_when_searching_twice_then_results_are_identical(family: NetworkRegistry) {
    assert_eq!(family.search("Bruno").unwrap(), family.search("Bruno").unwrap());
}

#[rstest]
fn given_family_when_rendering_then_siblings_follow_insertion_order(family: NetworkRegistry) {
    let rendered = family.render_tree().unwrap().to_string();

    let position = |name: &str| rendered.find(name).unwrap();
    assert!(rendered.starts_with("Ana"));
    assert!(position("Bruno") < position("Carla"));
    assert!(position("Carla") < position("Davi"));
    assert!(position("Davi") < position("Eva"));
}

#[rstest]
fn given_family_when_listing_edges_then_preorder_parent_child_pairs(family: NetworkRegistry) {
    let edges = family.edges();

    assert_eq!(
        edges,
        vec![
            ("Ana".to_string(), "Bruno".to_string()),
            ("Bruno".to_string(), "Carla".to_string()),
            ("Bruno".to_string(), "Davi".to_string()),
            ("Ana".to_string(), "Eva".to_string()),
        ]
    );
}

// ============================================================
// Profile editing
// ============================================================

#[rstest]
fn given_new_name_when_editing_then_all_structures_are_rekeyed(mut family: NetworkRegistry) {
    family.add_interaction("Bruno", "hello").unwrap();

    let info = family
        .edit_profile("Bruno", &ProfileUpdate::default().with_name("Beto"))
        .unwrap();

    assert_eq!(info.name, "Beto");
    assert_eq!(info.parent.as_deref(), Some("Ana"));
    assert_eq!(info.children, vec!["Carla".to_string(), "Davi".to_string()]);
    assert_eq!(info.interactions, vec!["hello".to_string()]);
    assert!(!family.contains("Bruno"));
    assert!(family.graph().has_edge("Ana", "Beto"));
    assert_eq!(family.tree().parent_of("Carla"), Some("Beto"));
    assert_consistent(&family);
}

#[rstest]
fn given_taken_name_when_renaming_then_rejected_without_change(mut family: NetworkRegistry) {
    let update = ProfileUpdate::default()
        .with_name("Eva")
        .with_bio("should not land");

    let err = family.edit_profile("Bruno", &update).unwrap_err();

    assert_eq!(err, DomainError::NameTaken("Eva".to_string()));
    assert!(family.contains("Bruno"));
    assert_eq!(family.user("Bruno").unwrap().bio, None);
    assert_consistent(&family);
}

#[rstest]
fn given_blank_fields_when_editing_then_current_values_are_kept(mut family: NetworkRegistry) {
    family
        .edit_profile(
            "Eva",
            &ProfileUpdate::default()
                .with_profile_image("eva.png")
                .with_bio("hi"),
        )
        .unwrap();

    let info = family
        .edit_profile(
            "Eva",
            &ProfileUpdate::default()
                .with_name("  ")
                .with_profile_image("")
                .with_bio("there"),
        )
        .unwrap();

    assert_eq!(info.name, "Eva");
    assert_eq!(info.profile_image.as_deref(), Some("eva.png"));
    assert_eq!(info.bio.as_deref(), Some("there"));
}

#[test]
fn given_unknown_user_when_editing_then_unknown_user() {
    let mut registry = NetworkRegistry::new();

    let err = registry
        .edit_profile("Zoe", &ProfileUpdate::default().with_bio("x"))
        .unwrap_err();

    assert_eq!(err, DomainError::UnknownUser("Zoe".to_string()));
}

// ============================================================
// Invariants over operation sequences
// ============================================================

#[rstest]
#[case::grow_and_prune(&["+a", "+b a", "+c b", "-b", "+d c", "-a", "-d"])]
#[case::rename_in_between(&["+a", "+b a", "~b z", "+c z", "-z", "~c b"])]
#[case::rejected_ops_mixed_in(&["+a", "+a", "-x", "+b q", "~b a", "+c b", "-c"])]
#[case::drain(&["+a", "+b a", "+c a", "-a", "-b", "-c"])]
fn given_operation_sequence_then_structures_stay_in_lockstep(#[case] ops: &[&str]) {
    let mut registry = NetworkRegistry::new();

    for op in ops {
        let (kind, args) = op.split_at(1);
        let mut args = args.split_whitespace();
        let first = args.next().unwrap();
        let second = args.next();
        // rejected operations are part of the sequence; only the invariant matters here
        let _ = match kind {
            "+" => registry.insert(first, second).map(|_| ()),
            "-" => registry.remove(first).map(|_| ()),
            "~" => registry
                .edit_profile(first, &ProfileUpdate::default().with_name(second.unwrap()))
                .map(|_| ()),
            other => panic!("unknown op {other}"),
        };
        assert_consistent(&registry);
    }
}
