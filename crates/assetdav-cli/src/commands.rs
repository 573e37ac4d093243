//! Filesystem-style commands over an [`AssetTree`].
//!
//! Each command takes the request context and writes its output to the
//! given writer, so the binary can hand them stdout and tests a buffer.

use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use assetdav_kernel::{AssetTree, DavContext, VirtualNode};
use assetdav_types::AssetKind;

/// Split `path` into its parent folder path and final name.
fn split_parent(path: &str) -> Result<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("{path}: the root folder has no name");
    }
    Ok(match trimmed.rsplit_once('/') {
        Some(("", name)) => ("/", name),
        Some((parent, name)) => (parent, name),
        None => ("/", trimmed),
    })
}

fn describe(node: &VirtualNode<'_>) -> String {
    let asset = node.asset();
    match &asset.kind {
        AssetKind::Folder => format!(
            "d {:>10} {:>12} {}/",
            "-",
            asset.modification_secs(),
            asset.filename
        ),
        AssetKind::File(meta) => format!(
            "- {:>10} {:>12} {}",
            meta.size,
            asset.modification_secs(),
            asset.filename
        ),
    }
}

pub fn ls(ctx: &DavContext, path: &str, long: bool, out: &mut dyn Write) -> Result<()> {
    let tree = AssetTree::new(ctx);
    let folder = tree
        .folder_for_path(path)
        .with_context(|| format!("ls {path}"))?;
    let listing = folder.list_children_report()?;
    for node in &listing.nodes {
        if long {
            writeln!(out, "{}", describe(node))?;
        } else if node.is_folder() {
            writeln!(out, "{}/", node.name())?;
        } else {
            writeln!(out, "{}", node.name())?;
        }
    }
    for skipped in &listing.skipped {
        eprintln!("assetdav: skipped asset {}: {}", skipped.id, skipped.error);
    }
    Ok(())
}

pub fn stat(ctx: &DavContext, path: &str, out: &mut dyn Write) -> Result<()> {
    let node = AssetTree::new(ctx)
        .node_for_path(path)
        .with_context(|| format!("stat {path}"))?;
    let asset = node.asset();
    writeln!(out, "id:       {}", asset.id)?;
    writeln!(out, "path:     {}", asset.path)?;
    writeln!(out, "kind:     {}", asset.kind.tag())?;
    if let VirtualNode::File(file) = &node {
        writeln!(out, "size:     {}", file.size())?;
        writeln!(out, "type:     {}", file.content_type().unwrap_or("-"))?;
        writeln!(out, "etag:     {}", file.etag())?;
    }
    writeln!(out, "modified: {}", asset.modification_secs())?;
    writeln!(out, "owner:    {}", asset.owner)?;
    writeln!(out, "modifier: {}", asset.modified_by)?;
    Ok(())
}

pub fn cat(ctx: &DavContext, path: &str, out: &mut dyn Write) -> Result<()> {
    let file = AssetTree::new(ctx)
        .node_for_path(path)
        .and_then(VirtualNode::into_file)
        .with_context(|| format!("cat {path}"))?;
    out.write_all(&file.get()?)?;
    Ok(())
}

/// Upload `content` to `path`: replace an existing file, or create a new
/// one in the parent folder.
pub fn put(ctx: &DavContext, path: &str, content: &mut dyn Read) -> Result<()> {
    let tree = AssetTree::new(ctx);
    match tree.node_for_path(path) {
        Ok(VirtualNode::File(mut file)) => {
            file.put(content).with_context(|| format!("put {path}"))?;
        }
        Ok(VirtualNode::Folder(_)) => bail!("put {path}: is a folder"),
        Err(e) if e.is_not_found() => {
            let (parent, name) = split_parent(path)?;
            tree.folder_for_path(parent)
                .and_then(|folder| folder.create_file(name, content))
                .with_context(|| format!("put {path}"))?;
        }
        Err(e) => return Err(e).with_context(|| format!("put {path}")),
    }
    Ok(())
}

pub fn mkdir(ctx: &DavContext, path: &str) -> Result<()> {
    let (parent, name) = split_parent(path)?;
    AssetTree::new(ctx)
        .folder_for_path(parent)
        .and_then(|folder| folder.create_directory(name))
        .with_context(|| format!("mkdir {path}"))?;
    Ok(())
}

pub fn rm(ctx: &DavContext, path: &str) -> Result<()> {
    AssetTree::new(ctx)
        .node_for_path(path)
        .and_then(|node| node.delete())
        .with_context(|| format!("rm {path}"))?;
    Ok(())
}

pub fn mv(ctx: &DavContext, src: &str, dest: &str) -> Result<()> {
    AssetTree::new(ctx)
        .move_node(src, dest)
        .with_context(|| format!("mv {src} {dest}"))?;
    Ok(())
}
