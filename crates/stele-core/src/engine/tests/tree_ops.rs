//! Tree operations and their URL side effects.

use super::*;

#[test]
fn create_location_derives_path_and_depth() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let products = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let widgets = publish_node(&repo, products.node_id, "Widgets")?;
    assert_eq!(widgets.parent_id, products.node_id);
    assert_eq!(
        widgets.path_string.as_str(),
        products.path_string.child(widgets.node_id).as_str()
    );
    assert_eq!(widgets.depth, products.depth + 1);
    assert!(widgets.is_main());
    widgets.path_string.verify_tail(widgets.node_id)?;
    Ok(())
}

#[test]
fn duplicate_remote_id_is_rejected() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let content = repo.create_content("Twin", false)?;
    repo.create_location(NewLocation::of_content(ROOT_NODE_ID, content.id, "same"))?;
    let err = repo
        .create_location(NewLocation::of_content(ROOT_NODE_ID, content.id, "same"))
        .unwrap_err();
    assert!(matches!(
        storage_err(&err),
        Some(StorageError::RemoteIdConflict(_))
    ));
    Ok(())
}

#[test]
fn loads_by_remote_id_and_updates_row_attributes() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let found = repo.load_location_by_remote_id(&node.remote_id)?;
    assert_eq!(found.node_id, node.node_id);

    let updated = repo.update_location(
        node.node_id,
        Some(5),
        Some("renamed-remote"),
        Some((SortField::Priority, SortOrder::Descending)),
    )?;
    assert_eq!(updated.priority, 5);
    assert_eq!(updated.remote_id, "renamed-remote");
    assert_eq!(updated.sort_field, SortField::Priority);
    assert_eq!(updated.sort_order, SortOrder::Descending);
    Ok(())
}

#[test]
fn move_rewrites_paths_and_forwards_old_urls() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let products = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let red = publish_node(&repo, products.node_id, "Red")?;
    let sub = publish_node(&repo, red.node_id, "Detail")?;
    let archive = publish_node(&repo, ROOT_NODE_ID, "Archive")?;

    let moved = repo.move_subtree(red.node_id, archive.node_id)?;
    assert_eq!(moved.parent_id, archive.node_id);
    assert_eq!(
        moved.path_string.as_str(),
        archive.path_string.child(red.node_id).as_str()
    );
    let sub_after = repo.load_location(sub.node_id)?;
    assert_eq!(sub_after.depth, moved.depth + 1);
    assert!(sub_after.path_string.is_descendant_of(&moved.path_string));

    assert_eq!(
        repo.translate("archive/red/detail", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: sub.node_id
        }
    );
    assert_eq!(
        repo.translate("products/red", &langs(&["eng-GB"]))?,
        Resolved::Redirect {
            path: "archive/red".to_string()
        }
    );
    Ok(())
}

#[test]
fn move_into_own_subtree_is_rejected() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let products = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let red = publish_node(&repo, products.node_id, "Red")?;
    for (moved, target) in [
        (products.node_id, red.node_id),
        (products.node_id, products.node_id),
        (ROOT_NODE_ID, products.node_id),
    ] {
        let err = repo.move_subtree(moved, target).unwrap_err();
        assert_eq!(
            storage_err(&err),
            Some(&StorageError::InvalidMove {
                node: moved,
                destination: target,
            })
        );
        assert!(err.to_string().contains("cannot move"));
    }
    Ok(())
}

#[test]
fn deleted_node_ids_are_never_reassigned() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let page = publish_node(&repo, ROOT_NODE_ID, "Page")?;
    repo.remove_subtree(page.node_id)?;
    // SQLite reuses a plain rowid after the max row is deleted; the trash
    // and alias tables rely on node ids staying unique forever.
    let next = publish_node(&repo, ROOT_NODE_ID, "Next")?;
    assert!(next.node_id > page.node_id);
    Ok(())
}

#[test]
fn move_under_hidden_parent_makes_subtree_invisible() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let dark = publish_node(&repo, ROOT_NODE_ID, "Dark")?;
    repo.hide(dark.node_id)?;
    let page = publish_node(&repo, ROOT_NODE_ID, "Page")?;

    let moved = repo.move_subtree(page.node_id, dark.node_id)?;
    assert!(!moved.hidden);
    assert!(moved.invisible);
    Ok(())
}

#[test]
fn copy_clones_subtree_without_stealing_source_urls() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let docs = publish_node(&repo, ROOT_NODE_ID, "Docs")?;
    let guide = publish_node(&repo, docs.node_id, "Guide")?;
    let backup = publish_node(&repo, ROOT_NODE_ID, "Backup")?;

    let copy = repo.copy_subtree(docs.node_id, backup.node_id, Some(42), &NoopObjectStates)?;
    assert_eq!(copy.parent_id, backup.node_id);
    assert_ne!(copy.content_id, docs.content_id);
    assert_eq!(repo.load_content_info(copy.content_id)?.owner_id, 42);

    let children = repo.load_children(copy.node_id)?;
    assert_eq!(children.len(), 1);
    assert_ne!(children[0].content_id, guide.content_id);
    assert_eq!(
        repo.translate("backup/docs/guide", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: children[0].node_id
        }
    );
    // The source keeps its URLs.
    assert_eq!(
        repo.translate("docs/guide", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: guide.node_id
        }
    );
    Ok(())
}

#[test]
fn copy_duplicates_shared_content_once() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let docs = publish_node(&repo, ROOT_NODE_ID, "Docs")?;
    let shared = repo.create_content("Shared", false)?;
    let first = repo.create_location(NewLocation::of_content(docs.node_id, shared.id, "sh-1"))?;
    let second = repo.create_location(NewLocation::of_content(docs.node_id, shared.id, "sh-2"))?;
    repo.publish_url_alias_for_location(first.node_id, "Shared One", "eng-GB", false)?;
    repo.publish_url_alias_for_location(second.node_id, "Shared Two", "eng-GB", false)?;
    let backup = publish_node(&repo, ROOT_NODE_ID, "Backup")?;

    let copy = repo.copy_subtree(docs.node_id, backup.node_id, None, &NoopObjectStates)?;
    let children = repo.load_children(copy.node_id)?;
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].content_id, children[1].content_id);
    assert_ne!(children[0].content_id, shared.id);
    // The copy's main location mirrors the original's choice.
    let copied_content = repo.load_content_info(children[0].content_id)?;
    let expected_main = children
        .iter()
        .find(|child| child.remote_id == text_md5(&format!("sh-1{}", child.node_id)))
        .map(|child| child.node_id);
    assert_eq!(Some(copied_content.main_node_id), expected_main);
    Ok(())
}

#[test]
fn swap_exchanges_content_and_urls_in_place() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let jedan = publish_node(&repo, ROOT_NODE_ID, "Jedan")?;
    let dva = publish_node(&repo, ROOT_NODE_ID, "Dva")?;
    let first = publish_node(&repo, jedan.node_id, "Swap")?;
    let second = publish_node(&repo, dva.node_id, "Swap")?;

    repo.swap_locations(first.node_id, second.node_id)?;

    // Same names on both sides: each slot keeps its node id.
    assert_eq!(
        repo.translate("jedan/swap", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: first.node_id
        }
    );
    assert_eq!(
        repo.translate("dva/swap", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: second.node_id
        }
    );
    // But the content behind each slot moved across.
    assert_eq!(
        repo.load_location(first.node_id)?.content_id,
        second.content_id
    );
    assert_eq!(
        repo.load_location(second.node_id)?.content_id,
        first.content_id
    );
    Ok(())
}

#[test]
fn swap_with_distinct_names_moves_urls_and_back() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let jedan = publish_node(&repo, ROOT_NODE_ID, "Jedan")?;
    let dva = publish_node(&repo, ROOT_NODE_ID, "Dva")?;
    let foo = publish_node(&repo, jedan.node_id, "Foo")?;
    let bar = publish_node(&repo, dva.node_id, "Bar")?;

    repo.swap_locations(foo.node_id, bar.node_id)?;
    assert_eq!(
        repo.translate("jedan/bar", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: foo.node_id
        }
    );
    assert_eq!(
        repo.translate("jedan/foo", &langs(&["eng-GB"]))?,
        Resolved::Redirect {
            path: "jedan/bar".to_string()
        }
    );

    // Swapping back restores the original URLs.
    repo.swap_locations(foo.node_id, bar.node_id)?;
    assert_eq!(
        repo.translate("jedan/foo", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: foo.node_id
        }
    );
    assert_eq!(
        repo.translate("dva/bar", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: bar.node_id
        }
    );
    Ok(())
}

#[test]
fn remove_subtree_archives_orphaned_published_content() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let first = publish_node(&repo, ROOT_NODE_ID, "Page")?;
    let mirror =
        repo.create_location(NewLocation::of_content(ROOT_NODE_ID, first.content_id, "mir"))?;
    repo.publish_url_alias_for_location(mirror.node_id, "Mirror", "eng-GB", false)?;

    repo.remove_subtree(mirror.node_id)?;
    assert_eq!(
        repo.load_content_info(first.content_id)?.status,
        ContentStatus::Published
    );

    repo.remove_subtree(first.node_id)?;
    assert_eq!(
        repo.load_content_info(first.content_id)?.status,
        ContentStatus::Archived
    );
    let err = repo.translate("page", &langs(&["eng-GB"])).unwrap_err();
    assert!(matches!(
        storage_err(&err),
        Some(StorageError::UrlNotFound(_))
    ));
    Ok(())
}

#[test]
fn hide_and_unhide_respect_nested_hidden_flags() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let outer = publish_node(&repo, ROOT_NODE_ID, "Outer")?;
    let inner = publish_node(&repo, outer.node_id, "Inner")?;

    repo.hide(outer.node_id)?;
    repo.hide(inner.node_id)?;
    assert!(repo.load_location(inner.node_id)?.invisible);

    let outer_after = repo.unhide(outer.node_id)?;
    assert!(!outer_after.hidden);
    assert!(!outer_after.invisible);
    // The inner node is hidden in its own right and stays invisible.
    let inner_after = repo.load_location(inner.node_id)?;
    assert!(inner_after.hidden);
    assert!(inner_after.invisible);

    assert!(!repo.unhide(inner.node_id)?.invisible);
    Ok(())
}

#[test]
fn unhide_under_hidden_ancestor_keeps_shadow() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let outer = publish_node(&repo, ROOT_NODE_ID, "Outer")?;
    let inner = publish_node(&repo, outer.node_id, "Inner")?;
    repo.hide(outer.node_id)?;
    repo.hide(inner.node_id)?;

    let inner_after = repo.unhide(inner.node_id)?;
    assert!(!inner_after.hidden);
    assert!(inner_after.invisible);
    Ok(())
}

#[test]
fn set_invisible_shades_the_subtree_without_hiding() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let outer = publish_node(&repo, ROOT_NODE_ID, "Outer")?;
    let inner = publish_node(&repo, outer.node_id, "Inner")?;

    let outer_after = repo.set_invisible(outer.node_id, true)?;
    assert!(!outer_after.hidden);
    assert!(outer_after.invisible);
    assert!(repo.load_location(inner.node_id)?.invisible);

    repo.set_invisible(outer.node_id, false)?;
    assert!(!repo.load_location(inner.node_id)?.invisible);
    Ok(())
}

#[test]
fn section_assignment_follows_main_locations() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let docs = publish_node(&repo, ROOT_NODE_ID, "Docs")?;
    let guide = publish_node(&repo, docs.node_id, "Guide")?;
    let changed = repo.set_section_for_subtree(docs.node_id, 7)?;
    assert_eq!(changed, 2);
    assert_eq!(repo.load_content_info(docs.content_id)?.section_id, 7);
    assert_eq!(repo.load_content_info(guide.content_id)?.section_id, 7);
    Ok(())
}

#[test]
fn change_main_location_updates_all_rows() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let first = publish_node(&repo, ROOT_NODE_ID, "Page")?;
    let mirror =
        repo.create_location(NewLocation::of_content(ROOT_NODE_ID, first.content_id, "mir"))?;
    assert!(!repo.load_location(mirror.node_id)?.is_main());

    repo.change_main_location(mirror.node_id)?;
    assert_eq!(
        repo.load_content_info(first.content_id)?.main_node_id,
        mirror.node_id
    );
    assert!(repo.load_location(mirror.node_id)?.is_main());
    assert!(!repo.load_location(first.node_id)?.is_main());
    Ok(())
}

#[test]
fn republish_after_rename_updates_every_location() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let first = publish_node(&repo, ROOT_NODE_ID, "Page")?;
    repo.set_content_name(first.content_id, "Leaf")?;
    repo.republish_aliases_for_content(first.content_id, "eng-GB")?;
    assert_eq!(
        repo.translate("leaf", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: first.node_id
        }
    );
    assert_eq!(
        repo.translate("page", &langs(&["eng-GB"]))?,
        Resolved::Redirect {
            path: "leaf".to_string()
        }
    );
    Ok(())
}

#[test]
fn always_available_flip_reaches_alias_entries() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node_in(&repo, ROOT_NODE_ID, "Impressum", "ger-DE", false)?;
    assert!(repo.translate("impressum", &langs(&["eng-GB"])).is_err());

    repo.set_always_available(node.content_id, true)?;
    assert_eq!(
        repo.translate("impressum", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );

    repo.set_always_available(node.content_id, false)?;
    assert!(repo.translate("impressum", &langs(&["eng-GB"])).is_err());
    Ok(())
}
