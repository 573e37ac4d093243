//! Integration tests for the asset filesystem facade.
//!
//! Each test builds a fresh in-memory repository, a principal with explicit
//! grants, and a private staging directory so temp-file leaks are visible.

use std::path::Path;
use std::sync::Arc;

use assetdav_kernel::vfs::valid_key;
use assetdav_kernel::{
    AssetRepository, DavContext, DavError, DavResult, MemoryRepository, NewAsset, StagingArea,
};
use assetdav_types::{Asset, AssetId, AssetKindTag, Capability, Principal, PrincipalId};
use tempfile::TempDir;

const ALL: [Capability; 5] = [
    Capability::View,
    Capability::Create,
    Capability::Delete,
    Capability::Rename,
    Capability::Publish,
];

struct Fixture {
    repo: Arc<MemoryRepository>,
    staging: TempDir,
    amy: Principal,
}

impl Fixture {
    fn new() -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let amy = Principal::named("amy", "Amy");
        repo.grant(amy.id, "/", ALL);
        Self {
            repo,
            staging: tempfile::tempdir().unwrap(),
            amy,
        }
    }

    fn ctx(&self) -> DavContext {
        self.ctx_as(self.amy.clone())
    }

    fn ctx_as(&self, principal: Principal) -> DavContext {
        DavContext::with_staging(
            self.repo.clone(),
            principal,
            StagingArea::new(self.staging.path()),
        )
    }

    fn ctx_with(&self, repo: Arc<dyn AssetRepository>) -> DavContext {
        DavContext::with_staging(repo, self.amy.clone(), StagingArea::new(self.staging.path()))
    }

    fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }
}

fn names(nodes: &[assetdav_kernel::VirtualNode<'_>]) -> Vec<String> {
    let mut names: Vec<_> = nodes.iter().map(|n| n.name().to_string()).collect();
    names.sort();
    names
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_list_children_returns_only_accessible_children() {
    let fx = Fixture::new();
    let root_ctx = fx.ctx();
    let root = root_ctx.tree().root().unwrap();
    for name in ["alpha", "beta", "gamma"] {
        root.create_directory(name).unwrap();
    }

    let bob = Principal::named("bob", "Bob");
    fx.repo.grant(bob.id, "/", [Capability::View]);
    fx.repo.grant(bob.id, "/beta", std::iter::empty());

    let ctx = fx.ctx_as(bob);
    let children = ctx.tree().root().unwrap().list_children().unwrap();
    assert_eq!(names(&children), vec!["alpha", "gamma"]);

    let children = root.list_children().unwrap();
    assert_eq!(names(&children), vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_list_children_reflects_permission_changes_immediately() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("shared").unwrap();

    let bob = Principal::named("bob", "Bob");
    let bob_ctx = fx.ctx_as(bob.clone());
    let bob_root = bob_ctx.tree().root().unwrap();
    assert!(bob_root.list_children().unwrap().is_empty());

    fx.repo.grant(bob.id, "/", [Capability::View]);
    assert_eq!(names(&bob_root.list_children().unwrap()), vec!["shared"]);
}

/// Returns one extra, malformed child from every listing.
struct BrokenChildRepo {
    inner: MemoryRepository,
}

impl AssetRepository for BrokenChildRepo {
    fn find_by_id(&self, id: AssetId) -> DavResult<Option<Asset>> {
        self.inner.find_by_id(id)
    }
    fn find_by_path(&self, path: &str) -> DavResult<Option<Asset>> {
        self.inner.find_by_path(path)
    }
    fn find_by_parent_and_filter(&self, parent_id: AssetId, p: &Principal) -> DavResult<Vec<Asset>> {
        let mut children = self.inner.find_by_parent_and_filter(parent_id, p)?;
        if let Some(first) = children.first() {
            let mut broken = first.clone();
            broken.id = AssetId::new(999);
            broken.filename = String::new();
            children.push(broken);
        }
        Ok(children)
    }
    fn read_content(&self, id: AssetId) -> DavResult<Vec<u8>> {
        self.inner.read_content(id)
    }
    fn create(&self, parent_id: AssetId, attrs: NewAsset) -> DavResult<Asset> {
        self.inner.create(parent_id, attrs)
    }
    fn delete(&self, id: AssetId) -> DavResult<()> {
        self.inner.delete(id)
    }
    fn save(&self, asset: &Asset) -> DavResult<()> {
        self.inner.save(asset)
    }
    fn replace_content(&self, id: AssetId, source: &Path, by: PrincipalId) -> DavResult<Asset> {
        self.inner.replace_content(id, source, by)
    }
    fn is_allowed(&self, asset: &Asset, c: Capability, p: &Principal) -> bool {
        self.inner.is_allowed(asset, c, p)
    }
}

#[test]
fn test_broken_child_is_skipped_not_fatal() {
    let fx = Fixture::new();
    let inner = MemoryRepository::new();
    inner.grant(fx.amy.id, "/", ALL);
    inner.create(AssetId::ROOT, NewAsset::folder("ok", &fx.amy)).unwrap();

    let ctx = fx.ctx_with(Arc::new(BrokenChildRepo { inner }));
    let root = ctx.tree().root().unwrap();

    let children = root.list_children().unwrap();
    assert_eq!(names(&children), vec!["ok"]);

    let report = root.list_children_report().unwrap();
    assert!(report.is_partial());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].id, AssetId::new(999));
    assert!(matches!(report.skipped[0].error, DavError::InvalidAsset { .. }));
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_child_with_no_matching_key_is_not_found() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("present").unwrap();

    for name in ["absent", "pres:ent", "a/b/absent"] {
        let err = root.child(name).unwrap_err();
        assert!(err.is_not_found(), "{name}: {err}");
        assert_eq!(err.status_code(), 404);
    }
}

#[test]
fn test_create_directory_then_child_round_trips() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("sub").unwrap();

    let sub = root.child("sub").unwrap();
    assert!(sub.is_folder());
    assert_eq!(sub.name(), valid_key("sub", AssetKindTag::Folder).unwrap());
    assert_eq!(sub.asset().owner, fx.amy.id);
}

#[test]
fn test_node_for_path_walks_and_rejects_files_midway() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("a").unwrap();
    let a = root.child("a").unwrap().into_folder().unwrap();
    a.create_file("f.txt", &mut &b"x"[..]).unwrap();

    let file = ctx.tree().node_for_path("/a/f.txt").unwrap();
    assert!(file.is_file());
    assert_eq!(file.asset().path, "/a/f.txt");

    let err = ctx.tree().node_for_path("/a/f.txt/deeper").unwrap_err();
    assert!(matches!(err, DavError::NotAFolder(_)));
}

// ============================================================================
// File creation and staging
// ============================================================================

#[test]
fn test_create_file_stores_sanitized_name_and_content() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();

    root.create_file("my:file?.txt", &mut &b"hello"[..]).unwrap();

    let expected = valid_key("my:file?.txt", AssetKindTag::File).unwrap();
    assert_eq!(expected, "my-file-.txt");
    assert_eq!(valid_key(&expected, AssetKindTag::File).unwrap(), expected);

    let node = root.child("my:file?.txt").unwrap().into_file().unwrap();
    assert_eq!(node.name(), expected);
    assert_eq!(node.get().unwrap(), b"hello");
    assert_eq!(node.size(), 5);
    assert_eq!(node.content_type(), Some("text/plain"));
    assert_eq!(node.asset().owner, fx.amy.id);
    assert_eq!(node.asset().modified_by, fx.amy.id);
    assert_eq!(fx.staged_files(), 0);
}

#[test]
fn test_create_file_without_permission_is_forbidden_and_leaves_no_temp_file() {
    let fx = Fixture::new();
    let viewer = Principal::named("viewer", "Viewer");
    fx.repo.grant(viewer.id, "/", [Capability::View]);

    let ctx = fx.ctx_as(viewer);
    let root = ctx.tree().root().unwrap();
    let err = root.create_file("a.txt", &mut &b"data"[..]).unwrap_err();

    assert!(err.is_forbidden());
    assert_eq!(err.status_code(), 403);
    assert_eq!(fx.staged_files(), 0);
    assert!(fx.repo.find_by_path("/a.txt").unwrap().is_none());
}

/// Delegates to a memory repository but fails every `create`.
struct FailingCreateRepo {
    inner: MemoryRepository,
    saw_staged_file: std::sync::atomic::AtomicBool,
}

impl AssetRepository for FailingCreateRepo {
    fn find_by_id(&self, id: AssetId) -> DavResult<Option<Asset>> {
        self.inner.find_by_id(id)
    }
    fn find_by_path(&self, path: &str) -> DavResult<Option<Asset>> {
        self.inner.find_by_path(path)
    }
    fn find_by_parent_and_filter(&self, parent_id: AssetId, p: &Principal) -> DavResult<Vec<Asset>> {
        self.inner.find_by_parent_and_filter(parent_id, p)
    }
    fn read_content(&self, id: AssetId) -> DavResult<Vec<u8>> {
        self.inner.read_content(id)
    }
    fn create(&self, _parent_id: AssetId, attrs: NewAsset) -> DavResult<Asset> {
        if let assetdav_kernel::AssetSource::File { path } = &attrs.source {
            self.saw_staged_file
                .store(path.exists(), std::sync::atomic::Ordering::SeqCst);
        }
        Err(DavError::repository("disk full"))
    }
    fn delete(&self, id: AssetId) -> DavResult<()> {
        self.inner.delete(id)
    }
    fn save(&self, asset: &Asset) -> DavResult<()> {
        self.inner.save(asset)
    }
    fn replace_content(&self, _id: AssetId, _source: &Path, _by: PrincipalId) -> DavResult<Asset> {
        Err(DavError::repository("disk full"))
    }
    fn is_allowed(&self, asset: &Asset, c: Capability, p: &Principal) -> bool {
        self.inner.is_allowed(asset, c, p)
    }
}

#[test]
fn test_failing_repository_still_removes_temp_file() {
    let fx = Fixture::new();
    let inner = MemoryRepository::new();
    inner.grant(fx.amy.id, "/", ALL);
    let src = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(src.path(), b"old").unwrap();
    inner
        .create(AssetId::ROOT, NewAsset::file("existing.txt", src.path(), &fx.amy))
        .unwrap();

    let repo = Arc::new(FailingCreateRepo {
        inner,
        saw_staged_file: Default::default(),
    });
    let ctx = fx.ctx_with(repo.clone());
    let root = ctx.tree().root().unwrap();

    let err = root.create_file("new.txt", &mut &b"payload"[..]).unwrap_err();
    assert!(matches!(err, DavError::Repository(_)));
    assert!(repo.saw_staged_file.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(fx.staged_files(), 0);

    let mut file = root.child("existing.txt").unwrap().into_file().unwrap();
    assert!(file.put(&mut &b"new"[..]).is_err());
    assert_eq!(fx.staged_files(), 0);
    assert_eq!(file.get().unwrap(), b"old");
}

#[test]
fn test_put_same_length_content_changes_etag() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_file("tag.txt", &mut &b"AAAA"[..]).unwrap();

    let mut file = root.child("tag.txt").unwrap().into_file().unwrap();
    let first = file.etag();
    file.put(&mut &b"BBBB"[..]).unwrap();
    let second = file.etag();
    file.put(&mut &b"CCCC"[..]).unwrap();

    assert_eq!(file.size(), 4);
    assert_eq!(file.get().unwrap(), b"CCCC");
    assert_ne!(first, second);
    assert_ne!(second, file.etag());

    let reread = ctx.tree().node_for_path("/tag.txt").unwrap().into_file().unwrap();
    assert_eq!(reread.etag(), file.etag());
}

#[test]
fn test_put_replaces_content_with_publish() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_file("notes.md", &mut &b"v1"[..]).unwrap();

    let mut file = root.child("notes.md").unwrap().into_file().unwrap();
    let etag_before = file.etag();
    file.put(&mut &b"version two"[..]).unwrap();
    assert_eq!(file.size(), 11);
    assert_eq!(file.get().unwrap(), b"version two");
    assert_ne!(file.etag(), etag_before);
    assert_eq!(fx.staged_files(), 0);

    let reader = Principal::named("reader", "Reader");
    fx.repo.grant(reader.id, "/", [Capability::View]);
    let reader_ctx = fx.ctx_as(reader);
    let mut theirs = reader_ctx
        .tree()
        .node_for_path("/notes.md")
        .unwrap()
        .into_file()
        .unwrap();
    assert_eq!(theirs.get().unwrap(), b"version two");
    assert!(theirs.put(&mut &b"nope"[..]).unwrap_err().is_forbidden());
}

// ============================================================================
// Rename, delete, move
// ============================================================================

#[test]
fn test_set_name_without_rename_is_forbidden_and_unchanged() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    ctx.tree().root().unwrap().create_directory("keep").unwrap();

    let guest = Principal::named("guest", "Guest");
    fx.repo
        .grant(guest.id, "/", [Capability::View, Capability::Create, Capability::Delete]);
    let guest_ctx = fx.ctx_as(guest);
    let mut node = guest_ctx.tree().node_for_path("/keep").unwrap();

    let err = node.set_name("renamed").unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(node.name(), "keep");
    assert!(fx.repo.find_by_path("/keep").unwrap().is_some());
    assert!(fx.repo.find_by_path("/renamed").unwrap().is_none());
}

#[test]
fn test_set_name_sanitizes_and_chains() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("old").unwrap();

    let mut node = root.child("old").unwrap().into_folder().unwrap();
    node.create_file("inner.txt", &mut &b"x"[..]).unwrap();
    let renamed = node.set_name("new|name").unwrap();
    assert_eq!(renamed.name(), "new-name");
    assert_eq!(renamed.asset().path, "/new-name");

    let inner = ctx.tree().node_for_path("/new-name/inner.txt").unwrap();
    assert_eq!(inner.name(), "inner.txt");
}

#[test]
fn test_delete_folder_cascades_to_children() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("f").unwrap();
    let f = root.child("f").unwrap().into_folder().unwrap();
    f.create_file("c.txt", &mut &b"child"[..]).unwrap();
    f.create_directory("nested").unwrap();
    assert!(fx.repo.find_by_path("/f/c.txt").unwrap().is_some());

    f.delete().unwrap();
    assert!(fx.repo.find_by_path("/f/c.txt").unwrap().is_none());
    assert!(fx.repo.find_by_path("/f/nested").unwrap().is_none());
    assert!(fx.repo.find_by_path("/f").unwrap().is_none());
}

#[test]
fn test_delete_without_permission_is_forbidden() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    ctx.tree().root().unwrap().create_directory("f").unwrap();

    let viewer = Principal::named("viewer", "Viewer");
    fx.repo.grant(viewer.id, "/", [Capability::View]);
    let viewer_ctx = fx.ctx_as(viewer);
    let node = viewer_ctx.tree().node_for_path("/f").unwrap();
    assert!(node.delete().unwrap_err().is_forbidden());
    assert!(fx.repo.find_by_path("/f").unwrap().is_some());
}

#[test]
fn test_move_across_folders_needs_rename_and_create() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("src").unwrap();
    root.create_directory("dst").unwrap();
    ctx.tree()
        .folder_for_path("/src")
        .unwrap()
        .create_file("doc.txt", &mut &b"body"[..])
        .unwrap();

    let mover = Principal::named("mover", "Mover");
    fx.repo.grant(mover.id, "/", [Capability::View, Capability::Rename]);
    let mover_ctx = fx.ctx_as(mover.clone());
    let err = mover_ctx.tree().move_node("/src/doc.txt", "/dst/doc.txt").unwrap_err();
    assert!(err.is_forbidden());

    fx.repo.grant(mover.id, "/dst", [Capability::View, Capability::Create]);
    let moved = mover_ctx
        .tree()
        .move_node("/src/doc.txt", "/dst/renamed?.txt")
        .unwrap();
    assert_eq!(moved.asset().path, "/dst/renamed-.txt");
    assert!(fx.repo.find_by_path("/src/doc.txt").unwrap().is_none());

    let file = moved.into_file().unwrap();
    assert_eq!(file.get().unwrap(), b"body");
}

#[test]
fn test_move_within_folder_is_rename() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    ctx.tree().root().unwrap().create_directory("a").unwrap();

    let moved = ctx.tree().move_node("/a", "/b").unwrap();
    assert_eq!(moved.asset().path, "/b");
    assert!(ctx.tree().move_node("/", "/c").is_err());
}

#[test]
fn test_move_into_own_subtree_is_rejected() {
    let fx = Fixture::new();
    let ctx = fx.ctx();
    let root = ctx.tree().root().unwrap();
    root.create_directory("a").unwrap();
    ctx.tree().folder_for_path("/a").unwrap().create_directory("b").unwrap();

    let err = ctx.tree().move_node("/a", "/a/b/a").unwrap_err();
    assert!(matches!(err, DavError::Validation(_)));
}
