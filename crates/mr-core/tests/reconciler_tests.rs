//! Reconciler operations against real registries and git working copies

use mr_core::{
    Error, ListFilter, Reconciler, RegistryFiles, RegistryState, RegistryStore,
    RepositoryDeclaration,
};
use mr_git::BackendType;
use mr_test_utils::git::{make_dirty, nested_dirs};
use mr_test_utils::registry::TestRegistry;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn init(registry: &TestRegistry, clean: bool) -> String {
    let mut reconciler =
        Reconciler::open(registry.root(), true, &RegistryFiles::default()).unwrap();
    reconciler.init(clean).unwrap()
}

fn open(registry: &TestRegistry) -> Reconciler {
    Reconciler::open(registry.root(), false, &RegistryFiles::default()).unwrap()
}

/// Write a registry with the given declarations and presence directly.
fn seed(registry: &TestRegistry, declarations: Vec<(&str, RepositoryDeclaration)>, present: &[&str]) {
    let store = RegistryStore::open(registry.root(), true, &RegistryFiles::default()).unwrap();
    let mut state = RegistryState::default();
    for (name, declaration) in declarations {
        state.declarations.insert(name.to_string(), declaration);
    }
    for name in present {
        state.presence.insert(name);
    }
    store.save(&state).unwrap();
}

fn declared(registry: &TestRegistry) -> Vec<String> {
    open(registry).state().declarations.keys().cloned().collect()
}

// =============================================================================
// init
// =============================================================================

#[test]
fn test_init_clean_creates_empty_documents() {
    let registry = TestRegistry::new();
    registry.working_copy("Shoes");

    let message = init(&registry, true);

    assert!(message.starts_with("Successfully initialized Mr. Repo at '"), "{message}");
    assert_eq!(registry.declarations_text(), "repos: {}\n");
    assert_eq!(registry.presence_text(), "");
}

#[test]
fn test_init_seeds_from_existing_tree() {
    let registry = TestRegistry::new();
    registry.working_copy("Shoes");
    registry.working_copy("drawer/Socks");

    init(&registry, false);

    assert_eq!(declared(&registry), ["Shoes", "Socks"]);
    assert_eq!(registry.presence(), ["Shoes", "Socks"]);
    let reconciler = open(&registry);
    assert_eq!(
        reconciler.state().declarations["Socks"].relative_path.as_deref(),
        Some("drawer/Socks")
    );
}

#[test]
fn test_init_starts_from_blank_state() {
    let registry = TestRegistry::new();
    seed(
        &registry,
        vec![("Hats", RepositoryDeclaration::new(BackendType::Git))],
        &[],
    );

    init(&registry, true);

    assert!(declared(&registry).is_empty());
}

#[test]
fn test_commands_other_than_init_need_a_registry() {
    let registry = TestRegistry::new();

    let err = Reconciler::open(registry.root(), false, &RegistryFiles::default()).unwrap_err();

    assert!(matches!(err, Error::NotARegistry { .. }));
    registry.assert_not_exists(".mr_repo.yml");
}

// =============================================================================
// add
// =============================================================================

#[test]
fn test_add_declares_and_marks_present() {
    let registry = TestRegistry::new();
    init(&registry, true);
    let url = registry.cloneable_working_copy("drawer/Socks");

    let message = open(&registry).add(&registry.path("drawer/Socks")).unwrap();

    assert_eq!(message, "Successfully added 'Socks' to Mr. Repo.");
    let reconciler = open(&registry);
    assert_eq!(
        reconciler.state().declarations["Socks"],
        RepositoryDeclaration::new(BackendType::Git)
            .with_remote(url)
            .with_path("drawer/Socks")
    );
    assert_eq!(registry.presence(), ["Socks"]);
    assert!(reconciler.list(ListFilter::All).starts_with("Socks - [Git] remote: "));
}

#[test]
fn test_add_without_remote_omits_it() {
    let registry = TestRegistry::new();
    init(&registry, true);
    registry.working_copy("Shoes");

    open(&registry).add(&registry.path("Shoes")).unwrap();

    let reconciler = open(&registry);
    assert_eq!(reconciler.state().declarations["Shoes"].remote_url, None);
    assert!(!registry.declarations_text().contains("remote"));
}

#[test]
fn test_add_twice_is_already_declared() {
    let registry = TestRegistry::new();
    init(&registry, true);
    registry.working_copy("Shoes");
    open(&registry).add(&registry.path("Shoes")).unwrap();
    let before = (registry.declarations_text(), registry.presence_text());

    let err = open(&registry).add(&registry.path("Shoes")).unwrap_err();

    assert!(matches!(err, Error::AlreadyDeclared { ref name, .. } if name == "Shoes"));
    assert_eq!(
        err.to_string(),
        "Shoes is already controlled by Mr. Repo (i.e it is in .mr_repo.yml)."
    );
    assert_eq!((registry.declarations_text(), registry.presence_text()), before);
}

#[test]
fn test_add_checks_name_before_working_copy() {
    let registry = TestRegistry::new();
    init(&registry, true);
    registry.working_copy("Shoes");
    open(&registry).add(&registry.path("Shoes")).unwrap();
    std::fs::create_dir_all(registry.path("closet/Shoes")).unwrap();

    let err = open(&registry).add(&registry.path("closet/Shoes")).unwrap_err();

    assert!(matches!(err, Error::AlreadyDeclared { .. }), "{err}");
}

#[test]
fn test_add_rejects_plain_directory() {
    let registry = TestRegistry::new();
    init(&registry, true);
    std::fs::create_dir_all(registry.path("Gloves")).unwrap();

    let err = open(&registry).add(&registry.path("Gloves")).unwrap_err();

    assert!(matches!(err, Error::UnsupportedRepository { .. }), "{err}");
    assert!(declared(&registry).is_empty());
}

#[test]
fn test_add_rejects_registry_root() {
    let registry = TestRegistry::new();
    init(&registry, true);

    let err = open(&registry).add(registry.root()).unwrap_err();

    assert!(matches!(err, Error::UnsupportedRepository { .. }), "{err}");
}

// =============================================================================
// rm
// =============================================================================

#[test]
fn test_rm_forgets_declaration_and_presence() {
    let registry = TestRegistry::new();
    registry.working_copy("Shoes");
    init(&registry, false);

    let message = open(&registry).rm("Shoes").unwrap();

    assert_eq!(message, "Successfully removed 'Shoes' from Mr. Repo control.");
    assert!(declared(&registry).is_empty());
    assert!(registry.presence().is_empty());
    // Only the registration is forgotten
    registry.assert_exists("Shoes/.git");

    let err = open(&registry).get("Shoes").unwrap_err();
    assert!(matches!(err, Error::UnknownRepository { .. }));
}

#[test]
fn test_rm_accepts_a_path_argument() {
    let registry = TestRegistry::new();
    registry.working_copy("drawer/Socks");
    init(&registry, false);

    open(&registry).rm("drawer/Socks").unwrap();

    assert!(declared(&registry).is_empty());
}

#[test]
fn test_rm_unknown_name() {
    let registry = TestRegistry::new();
    init(&registry, true);

    let err = open(&registry).rm("Ghost").unwrap_err();

    assert_eq!(err.to_string(), "'Ghost' is not a Mr. Repo controlled repository.");
}

#[test]
fn test_rm_of_unavailable_declaration() {
    let registry = TestRegistry::new();
    seed(
        &registry,
        vec![("Hats", RepositoryDeclaration::new(BackendType::Git))],
        &[],
    );

    open(&registry).rm("Hats").unwrap();

    assert!(declared(&registry).is_empty());
    assert_eq!(registry.presence_text(), "");
}

// =============================================================================
// get
// =============================================================================

#[test]
fn test_get_clones_into_declared_path() {
    let registry = TestRegistry::new();
    let url = registry.remote("Hats");
    seed(
        &registry,
        vec![(
            "Hats",
            RepositoryDeclaration::new(BackendType::Git)
                .with_remote(url)
                .with_path("closet/Hats"),
        )],
        &[],
    );

    let message = open(&registry).get("Hats").unwrap();

    assert!(message.starts_with("Successfully cloned 'Hats' into '"), "{message}");
    registry.assert_exists("closet/Hats/.git");
    registry.assert_exists("closet/Hats/README.md");
    assert_eq!(registry.presence(), ["Hats"]);
}

#[test]
fn test_get_defaults_path_to_name() {
    let registry = TestRegistry::new();
    let url = registry.remote("Hats");
    seed(
        &registry,
        vec![("Hats", RepositoryDeclaration::new(BackendType::Git).with_remote(url))],
        &[],
    );

    open(&registry).get("Hats").unwrap();

    registry.assert_exists("Hats/.git");
}

#[test]
fn test_get_into_populated_path_is_clone_failure() {
    let registry = TestRegistry::new();
    registry.cloneable_working_copy("Shoes");
    init(&registry, false);

    let err = open(&registry).get("Shoes").unwrap_err();

    assert!(matches!(err, Error::CloneFailure { .. }), "{err}");
    assert_eq!(registry.presence(), ["Shoes"]);
}

#[test]
fn test_get_after_unget_restores_working_copy() {
    let registry = TestRegistry::new();
    registry.cloneable_working_copy("Shoes");
    init(&registry, false);
    open(&registry).unget("Shoes", false).unwrap();
    registry.assert_not_exists("Shoes");

    open(&registry).get("Shoes").unwrap();

    registry.assert_exists("Shoes/README.md");
    assert_eq!(registry.presence(), ["Shoes"]);
}

#[test]
fn test_get_without_remote() {
    let registry = TestRegistry::new();
    seed(
        &registry,
        vec![("Hats", RepositoryDeclaration::new(BackendType::Git))],
        &[],
    );

    let err = open(&registry).get("Hats").unwrap_err();

    assert_eq!(
        err.to_string(),
        "Hats does not have an associated remote to repossess it from."
    );
    registry.assert_not_exists("Hats");
}

#[test]
fn test_get_unknown_backend() {
    let registry = TestRegistry::new();
    seed(
        &registry,
        vec![(
            "Hats",
            RepositoryDeclaration::new(BackendType::from("Mercurial"))
                .with_remote("ssh://hg.example.com/hats"),
        )],
        &[],
    );

    let err = open(&registry).get("Hats").unwrap_err();

    assert!(matches!(err, Error::UnsupportedBackend { .. }), "{err}");
    assert!(registry.presence().is_empty());
}

#[test]
fn test_get_rejects_lowercase_backend_tag() {
    let registry = TestRegistry::new();
    let url = registry.remote("Hats");
    std::fs::write(
        registry.path(".mr_repo.yml"),
        format!("repos:\n  Hats:\n    type: git\n    remote: {url}\n"),
    )
    .unwrap();

    let err = open(&registry).get("Hats").unwrap_err();

    assert!(matches!(err, Error::UnsupportedBackend { .. }), "{err}");
    registry.assert_not_exists("Hats");
    open(&registry).update().unwrap();
    assert!(registry.declarations_text().contains("type: git"));
}

#[test]
fn test_get_reports_missing_remote_before_backend() {
    let registry = TestRegistry::new();
    seed(
        &registry,
        vec![("Hats", RepositoryDeclaration::new(BackendType::from("Mercurial")))],
        &[],
    );

    let err = open(&registry).get("Hats").unwrap_err();

    assert!(matches!(err, Error::NoRemote { .. }), "{err}");
}

#[test]
fn test_failed_clone_leaves_registry_untouched() {
    let registry = TestRegistry::new();
    let missing = registry.root().join("no-such-remote");
    seed(
        &registry,
        vec![(
            "Hats",
            RepositoryDeclaration::new(BackendType::Git)
                .with_remote(missing.to_string_lossy()),
        )],
        &[],
    );
    let before = registry.presence_text();

    let err = open(&registry).get("Hats").unwrap_err();

    assert!(matches!(err, Error::CloneFailure { .. }), "{err}");
    assert_eq!(registry.presence_text(), before);
}

// =============================================================================
// unget
// =============================================================================

#[test]
fn test_unget_removes_clean_working_copy() {
    let registry = TestRegistry::new();
    registry.committed_working_copy("Shoes");
    init(&registry, false);

    let message = open(&registry).unget("Shoes", false).unwrap();

    assert_eq!(message, "Successfully removed the local copy of 'Shoes'.");
    registry.assert_not_exists("Shoes");
    assert!(registry.presence().is_empty());
    assert_eq!(declared(&registry), ["Shoes"]);
}

#[test]
fn test_unget_dirty_requires_force() {
    let registry = TestRegistry::new();
    registry.committed_working_copy("Shoes");
    init(&registry, false);
    make_dirty(&registry.path("Shoes"));

    let err = open(&registry).unget("Shoes", false).unwrap_err();
    assert!(matches!(err, Error::DirtyWorkingCopy { .. }), "{err}");
    registry.assert_exists("Shoes/README.md");
    assert_eq!(registry.presence(), ["Shoes"]);

    open(&registry).unget("Shoes", true).unwrap();
    registry.assert_not_exists("Shoes");
    assert!(registry.presence().is_empty());
}

#[test]
fn test_forced_unget_keeps_directory_that_is_not_a_working_copy() {
    let registry = TestRegistry::new();
    std::fs::create_dir_all(registry.path("notes")).unwrap();
    std::fs::write(registry.path("notes/precious.txt"), "keep me").unwrap();
    seed(
        &registry,
        vec![("notes", RepositoryDeclaration::new(BackendType::Git))],
        &["notes"],
    );

    let err = open(&registry).unget("notes", true).unwrap_err();

    assert!(matches!(err, Error::UnsupportedRepository { .. }), "{err}");
    registry.assert_exists("notes/precious.txt");
    assert_eq!(registry.presence(), ["notes"]);
}

#[rstest]
#[case::root(".")]
#[case::root_via_parent("drawer/..")]
#[case::outside_root("../elsewhere")]
fn test_forced_unget_refuses_paths_not_below_root(#[case] relative: &str) {
    let registry = TestRegistry::new();
    registry.committed_working_copy("Shoes");
    seed(
        &registry,
        vec![(
            "Shoes",
            RepositoryDeclaration::new(BackendType::Git).with_path(relative),
        )],
        &["Shoes"],
    );

    let err = open(&registry).unget("Shoes", true).unwrap_err();

    assert!(matches!(err, Error::UnsupportedRepository { .. }), "{err}");
    registry.assert_exists("Shoes/README.md");
    registry.assert_exists(".mr_repo.yml");
    assert_eq!(registry.presence(), ["Shoes"]);
}

#[cfg(unix)]
#[test]
fn test_forced_unget_refuses_link_to_root() {
    let registry = TestRegistry::new();
    git2::Repository::init(registry.root()).unwrap();
    std::os::unix::fs::symlink(registry.root(), registry.path("loop")).unwrap();
    seed(
        &registry,
        vec![("loop", RepositoryDeclaration::new(BackendType::Git))],
        &["loop"],
    );

    let err = open(&registry).unget("loop", true).unwrap_err();

    assert!(matches!(err, Error::UnsupportedRepository { .. }), "{err}");
    registry.assert_exists(".git");
    registry.assert_exists(".mr_repo.yml");
}

#[test]
fn test_unget_requires_checked_out() {
    let registry = TestRegistry::new();
    seed(
        &registry,
        vec![("Hats", RepositoryDeclaration::new(BackendType::Git))],
        &[],
    );

    for name in ["Hats", "Ghost"] {
        let err = open(&registry).unget(name, true).unwrap_err();
        assert!(matches!(err, Error::NotCheckedOut { .. }), "{err}");
    }
}

#[test]
fn test_unget_of_missing_directory_heals_presence() {
    let registry = TestRegistry::new();
    seed(
        &registry,
        vec![("Hats", RepositoryDeclaration::new(BackendType::Git))],
        &["Hats"],
    );

    open(&registry).unget("Hats", false).unwrap();

    assert!(registry.presence().is_empty());
}

// =============================================================================
// update
// =============================================================================

#[test]
fn test_update_is_idempotent() {
    let registry = TestRegistry::new();
    init(&registry, true);
    registry.working_copy("Shoes");
    registry.working_copy("drawer/Socks");

    assert_eq!(
        open(&registry).update().unwrap(),
        "Successfully added 2 new repositories."
    );
    let after_first = registry.declarations_text();

    assert_eq!(
        open(&registry).update().unwrap(),
        "No updates made to controlled repos."
    );
    assert_eq!(registry.declarations_text(), after_first);
}

#[test]
fn test_update_skips_basename_collisions() {
    let registry = TestRegistry::new();
    init(&registry, true);
    registry.working_copy("Shoes");
    registry.working_copy("closet/Shoes");

    let message = open(&registry).update().unwrap();

    assert_eq!(message, "Successfully added 1 new repositories.");
    let reconciler = open(&registry);
    assert_eq!(
        reconciler.state().declarations["Shoes"].relative_path.as_deref(),
        Some("Shoes")
    );
}

#[test]
fn test_update_respects_depth_bound() {
    let registry = TestRegistry::new();
    init(&registry, true);
    let four = nested_dirs(&registry.path("four"), 3, "level_");
    mr_test_utils::git::init_repo(&four.join("Socks"));
    let five = nested_dirs(&registry.path("five"), 4, "level_");
    mr_test_utils::git::init_repo(&five.join("Stockings"));

    open(&registry).update().unwrap();

    assert_eq!(declared(&registry), ["Socks"]);
}

// =============================================================================
// list
// =============================================================================

fn wardrobe(registry: &TestRegistry) {
    seed(
        registry,
        vec![
            (
                "Shoes",
                RepositoryDeclaration::new(BackendType::Git)
                    .with_remote("https://example.com/shoes.git")
                    .with_path("Shoes"),
            ),
            (
                "Socks",
                RepositoryDeclaration::new(BackendType::Git).with_path("drawer/Socks"),
            ),
            (
                "Hats",
                RepositoryDeclaration::new(BackendType::from("Mercurial"))
                    .with_remote("ssh://hg.example.com/hats"),
            ),
        ],
        &["Socks", "Shoes"],
    );
}

#[test]
fn test_list_all() {
    let registry = TestRegistry::new();
    wardrobe(&registry);

    insta::assert_snapshot!(open(&registry).list(ListFilter::All), @r"
    Hats  - [Mercurial] remote: ssh://hg.example.com/hats
    Shoes - [Git] remote: https://example.com/shoes.git, path: Shoes
    Socks - [Git] path: drawer/Socks
    ");
}

#[test]
fn test_list_present_pads_to_listed_names() {
    let registry = TestRegistry::new();
    wardrobe(&registry);

    insta::assert_snapshot!(open(&registry).list(ListFilter::Present), @r"
    Shoes - [Git] remote: https://example.com/shoes.git, path: Shoes
    Socks - [Git] path: drawer/Socks
    ");
}

#[test]
fn test_list_unavailable() {
    let registry = TestRegistry::new();
    wardrobe(&registry);

    assert_eq!(
        open(&registry).list(ListFilter::Unavailable),
        "Hats - [Mercurial] remote: ssh://hg.example.com/hats"
    );
}

#[test]
fn test_list_ignores_stale_presence_entries() {
    let registry = TestRegistry::new();
    wardrobe(&registry);
    std::fs::write(registry.path(".this_repo"), "Ghost\nSocks\n").unwrap();

    let reconciler = open(&registry);

    assert_eq!(reconciler.list(ListFilter::Present), "Socks - [Git] path: drawer/Socks");
    // The stale entry is only dropped from disk by the next write
    assert_eq!(registry.presence(), ["Ghost", "Socks"]);
}

#[test]
fn test_list_of_empty_registry() {
    let registry = TestRegistry::new();
    init(&registry, true);

    assert_eq!(open(&registry).list(ListFilter::All), "");
}
