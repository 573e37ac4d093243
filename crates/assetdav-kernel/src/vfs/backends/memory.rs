//! In-memory asset repository.
//!
//! Used for tests and by the CLI, which loads and persists it as a JSON
//! snapshot. Paths are never stored: they are derived from the parent chain
//! on every read, so a rename or move shows up immediately in every
//! descendant's path.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use assetdav_types::{
    Asset, AssetId, AssetKind, AssetRecord, Capability, FileMeta, Principal, PrincipalId,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::vfs::error::{DavError, DavResult};
use crate::vfs::repository::{AssetRepository, AssetSource, NewAsset};

/// Stored asset: persisted fields plus content for files.
#[derive(Debug, Clone)]
struct Entry {
    record: AssetRecord,
    content: Vec<u8>,
}

/// Capabilities a principal holds on a subtree.
#[derive(Debug, Clone)]
struct Grant {
    principal: PrincipalId,
    prefix: String,
    capabilities: BTreeSet<Capability>,
}

#[derive(Debug)]
struct State {
    entries: BTreeMap<AssetId, Entry>,
    next_id: AssetId,
    admins: HashSet<PrincipalId>,
    grants: Vec<Grant>,
}

/// Normalize a grant prefix: leading `/`, no trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn prefix_matches(prefix: &str, path: &str) -> bool {
    prefix == "/" || path == prefix || path.starts_with(&format!("{prefix}/"))
}

fn guess_mime(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

impl State {
    fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: AssetId::ROOT.next(),
            admins: HashSet::new(),
            grants: Vec::new(),
        }
    }

    fn get(&self, id: AssetId) -> DavResult<&Entry> {
        self.entries
            .get(&id)
            .ok_or_else(|| DavError::not_found(format!("asset {id}")))
    }

    /// Absolute path of `id`, walking up to the root.
    fn path_of(&self, id: AssetId) -> DavResult<String> {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let entry = self.get(current)?;
            let Some(parent) = entry.record.parent_id else {
                break;
            };
            segments.push(entry.record.filename.as_str());
            if segments.len() > self.entries.len() {
                return Err(DavError::repository(format!("parent cycle at asset {id}")));
            }
            current = parent;
        }
        segments.reverse();
        Ok(format!("/{}", segments.join("/")))
    }

    fn materialize(&self, entry: &Entry) -> DavResult<Asset> {
        let path = self.path_of(entry.record.id)?;
        Ok(Asset::from_record(entry.record.clone(), path))
    }

    fn child_named(&self, parent: AssetId, name: &str) -> Option<AssetId> {
        self.entries
            .values()
            .find(|e| e.record.parent_id == Some(parent) && e.record.filename == name)
            .map(|e| e.record.id)
    }

    fn lookup_path(&self, path: &str) -> Option<AssetId> {
        let mut current = AssetId::ROOT;
        self.entries.get(&current)?;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self.child_named(current, segment)?;
        }
        Some(current)
    }

    /// `id` and everything below it.
    fn subtree(&self, id: AssetId) -> Vec<AssetId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            let parent = out[i];
            out.extend(
                self.entries
                    .values()
                    .filter(|e| e.record.parent_id == Some(parent))
                    .map(|e| e.record.id),
            );
            i += 1;
        }
        out
    }

    fn require_folder(&self, id: AssetId) -> DavResult<()> {
        let entry = self.get(id)?;
        if entry.record.kind.is_folder() {
            Ok(())
        } else {
            Err(DavError::not_a_folder(self.path_of(id)?))
        }
    }

    fn require_unique(&self, parent: AssetId, filename: &str, except: Option<AssetId>) -> DavResult<()> {
        match self.child_named(parent, filename) {
            Some(existing) if Some(existing) != except => Err(DavError::already_exists(
                assetdav_types::join_path(&self.path_of(parent)?, filename),
            )),
            _ => Ok(()),
        }
    }

    /// Longest-prefix grant decides; administrators hold everything.
    fn allows(&self, path: &str, capability: Capability, principal: PrincipalId) -> bool {
        if self.admins.contains(&principal) {
            return true;
        }
        self.grants
            .iter()
            .filter(|g| g.principal == principal && prefix_matches(&g.prefix, path))
            .max_by_key(|g| g.prefix.len())
            .is_some_and(|g| g.capabilities.contains(&capability))
    }
}

fn check_filename(filename: &str) -> DavResult<()> {
    if filename.is_empty() || filename.contains('/') {
        return Err(DavError::validation(format!("{filename:?} is not a valid asset key")));
    }
    Ok(())
}

/// In-memory asset repository.
///
/// Thread-safe via an internal `RwLock`. The root folder (id 1) always
/// exists.
#[derive(Debug)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    /// Create a repository holding only the root folder.
    pub fn new() -> Self {
        let now = SystemTime::now();
        let system = PrincipalId::system();
        let mut state = State::empty();
        state.entries.insert(
            AssetId::ROOT,
            Entry {
                record: AssetRecord {
                    id: AssetId::ROOT,
                    parent_id: None,
                    filename: String::new(),
                    kind: AssetKind::Folder,
                    creation_date: now,
                    modification_date: now,
                    owner: system,
                    modified_by: system,
                },
                content: Vec::new(),
            },
        );
        Self {
            state: RwLock::new(state),
        }
    }

    /// The root folder.
    pub fn root(&self) -> DavResult<Asset> {
        let state = self.state.read();
        state.materialize(state.get(AssetId::ROOT)?)
    }

    /// Number of assets, root included.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Let `principal` pass every capability check.
    pub fn add_admin(&self, principal: PrincipalId) {
        self.state.write().admins.insert(principal);
    }

    /// Grant capabilities on the subtree at `prefix`.
    ///
    /// The most specific matching grant wins, so a narrower grant can take
    /// capabilities away from a broader one.
    pub fn grant(
        &self,
        principal: PrincipalId,
        prefix: &str,
        capabilities: impl IntoIterator<Item = Capability>,
    ) {
        let prefix = normalize_prefix(prefix);
        let capabilities: BTreeSet<_> = capabilities.into_iter().collect();
        let mut state = self.state.write();
        state
            .grants
            .retain(|g| !(g.principal == principal && g.prefix == prefix));
        state.grants.push(Grant {
            principal,
            prefix,
            capabilities,
        });
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Serializable copy of all assets and content. Grants are not included.
    pub fn snapshot(&self) -> RepositorySnapshot {
        let state = self.state.read();
        RepositorySnapshot {
            next_id: state.next_id,
            assets: state
                .entries
                .values()
                .map(|e| SnapshotEntry {
                    record: e.record.clone(),
                    content: e.record.kind.is_file().then(|| BASE64.encode(&e.content)),
                })
                .collect(),
        }
    }

    /// Rebuild a repository from a snapshot, checking its structure.
    ///
    /// Rejects a missing root, dangling or non-folder parents, parent
    /// cycles, invalid filenames and duplicate names within a folder.
    pub fn from_snapshot(snapshot: RepositorySnapshot) -> DavResult<Self> {
        let mut state = State::empty();
        for item in snapshot.assets {
            let content = match item.content {
                Some(encoded) => BASE64
                    .decode(encoded)
                    .map_err(|e| DavError::repository(format!("asset {}: {e}", item.record.id)))?,
                None => Vec::new(),
            };
            let id = item.record.id;
            if state.entries.insert(id, Entry { record: item.record, content }).is_some() {
                return Err(DavError::repository(format!("duplicate asset id {id}")));
            }
        }

        match state.entries.get(&AssetId::ROOT) {
            Some(root)
                if root.record.parent_id.is_none()
                    && root.record.kind.is_folder()
                    && root.record.filename.is_empty() => {}
            _ => return Err(DavError::repository("snapshot has no root folder")),
        }
        for entry in state.entries.values() {
            if entry.record.id != AssetId::ROOT && entry.record.parent_id.is_none() {
                return Err(DavError::repository(format!(
                    "asset {} has no parent",
                    entry.record.id
                )));
            }
            if let Some(parent) = entry.record.parent_id {
                let id = entry.record.id;
                check_filename(&entry.record.filename)
                    .and_then(|()| state.require_folder(parent))
                    .and_then(|()| state.require_unique(parent, &entry.record.filename, Some(id)))
                    .map_err(|e| DavError::repository(format!("asset {id}: {e}")))?;
            }
            state.path_of(entry.record.id)?;
        }

        let max_id = state.entries.keys().next_back().copied().unwrap_or(AssetId::ROOT);
        state.next_id = snapshot.next_id.max(max_id.next());
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Load a JSON snapshot from disk.
    pub fn load(path: &Path) -> DavResult<Self> {
        let json = fs::read_to_string(path)?;
        let snapshot: RepositorySnapshot = serde_json::from_str(&json)
            .map_err(|e| DavError::repository(format!("{}: {e}", path.display())))?;
        Self::from_snapshot(snapshot)
    }

    /// Write a JSON snapshot to disk, replacing the file atomically.
    pub fn persist(&self, path: &Path) -> DavResult<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let json = serde_json::to_vec_pretty(&self.snapshot())
            .map_err(|e| DavError::repository(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, &json)?;
        tmp.persist(path).map_err(|e| DavError::Io(e.error))?;
        Ok(())
    }
}

/// On-disk form of a [`MemoryRepository`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    pub next_id: AssetId,
    pub assets: Vec<SnapshotEntry>,
}

/// One asset in a snapshot; file content is base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub record: AssetRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl AssetRepository for MemoryRepository {
    fn find_by_id(&self, id: AssetId) -> DavResult<Option<Asset>> {
        let state = self.state.read();
        state.entries.get(&id).map(|e| state.materialize(e)).transpose()
    }

    fn find_by_path(&self, path: &str) -> DavResult<Option<Asset>> {
        let state = self.state.read();
        state
            .lookup_path(path)
            .map(|id| state.materialize(state.get(id)?))
            .transpose()
    }

    fn find_by_parent_and_filter(
        &self,
        parent_id: AssetId,
        principal: &Principal,
    ) -> DavResult<Vec<Asset>> {
        let state = self.state.read();
        state.require_folder(parent_id)?;

        let mut children = Vec::new();
        for entry in state.entries.values() {
            if entry.record.parent_id != Some(parent_id) {
                continue;
            }
            let asset = state.materialize(entry)?;
            if state.allows(&asset.path, Capability::View, principal.id) {
                children.push(asset);
            }
        }
        children.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(children)
    }

    fn read_content(&self, id: AssetId) -> DavResult<Vec<u8>> {
        let state = self.state.read();
        let entry = state.get(id)?;
        if entry.record.kind.is_folder() {
            return Err(DavError::validation(format!("{} is a folder", state.path_of(id)?)));
        }
        Ok(entry.content.clone())
    }

    fn create(&self, parent_id: AssetId, attrs: NewAsset) -> DavResult<Asset> {
        check_filename(&attrs.filename)?;

        // Read staged content before taking the lock.
        let (kind, content) = match &attrs.source {
            AssetSource::Folder => (AssetKind::Folder, Vec::new()),
            AssetSource::File { path } => {
                let bytes = fs::read(path)?;
                let meta = FileMeta::new(bytes.len() as u64, guess_mime(&attrs.filename));
                (AssetKind::File(meta), bytes)
            }
        };

        let mut state = self.state.write();
        state.require_folder(parent_id)?;
        state.require_unique(parent_id, &attrs.filename, None)?;

        let id = state.next_id;
        state.next_id = id.next();
        let now = SystemTime::now();
        let entry = Entry {
            record: AssetRecord {
                id,
                parent_id: Some(parent_id),
                filename: attrs.filename,
                kind,
                creation_date: now,
                modification_date: now,
                owner: attrs.owner,
                modified_by: attrs.modified_by,
            },
            content,
        };
        state.entries.insert(id, entry);
        state.materialize(state.get(id)?)
    }

    fn delete(&self, id: AssetId) -> DavResult<()> {
        if id.is_root() {
            return Err(DavError::validation("the root folder cannot be deleted"));
        }
        let mut state = self.state.write();
        state.get(id)?;
        let doomed = state.subtree(id);
        tracing::debug!(asset = %id, count = doomed.len(), "removing subtree");
        for victim in doomed {
            state.entries.remove(&victim);
        }
        Ok(())
    }

    fn save(&self, asset: &Asset) -> DavResult<()> {
        let mut state = self.state.write();
        let current = state.get(asset.id)?.record.clone();

        match (current.parent_id, asset.parent_id) {
            (None, None) => {
                if !asset.filename.is_empty() {
                    return Err(DavError::validation("the root folder cannot be renamed"));
                }
            }
            (Some(_), Some(new_parent)) => {
                check_filename(&asset.filename)?;
                state.require_folder(new_parent)?;
                if state.subtree(asset.id).contains(&new_parent) {
                    return Err(DavError::validation(format!(
                        "cannot move {} into its own subtree",
                        state.path_of(asset.id)?
                    )));
                }
                state.require_unique(new_parent, &asset.filename, Some(asset.id))?;
            }
            _ => return Err(DavError::validation("the root folder cannot be moved")),
        }

        let entry = state
            .entries
            .get_mut(&asset.id)
            .ok_or_else(|| DavError::not_found(format!("asset {}", asset.id)))?;
        entry.record.parent_id = asset.parent_id;
        entry.record.filename = asset.filename.clone();
        entry.record.modified_by = asset.modified_by;
        entry.record.modification_date = SystemTime::now();
        Ok(())
    }

    fn replace_content(
        &self,
        id: AssetId,
        source: &Path,
        modified_by: PrincipalId,
    ) -> DavResult<Asset> {
        let bytes = fs::read(source)?;

        let mut state = self.state.write();
        let path = state.path_of(id)?;
        let entry = state
            .entries
            .get_mut(&id)
            .ok_or_else(|| DavError::not_found(format!("asset {id}")))?;
        let AssetKind::File(meta) = &mut entry.record.kind else {
            return Err(DavError::validation(format!("{path} is a folder")));
        };
        meta.bump(bytes.len() as u64);
        entry.content = bytes;
        entry.record.modified_by = modified_by;
        entry.record.modification_date = SystemTime::now();
        Ok(Asset::from_record(entry.record.clone(), path))
    }

    fn is_allowed(&self, asset: &Asset, capability: Capability, principal: &Principal) -> bool {
        self.state.read().allows(&asset.path, capability, principal.id)
    }
}
