//! Publishing, renaming, and the history entries those leave behind.

use super::*;

#[test]
fn publish_makes_url_resolvable() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let products = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    assert_eq!(
        repo.translate("products", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: products.node_id
        }
    );
    assert_eq!(
        repo.load_autogenerated_path(products.node_id, &langs(&["eng-GB"]))?,
        "products"
    );
    Ok(())
}

#[test]
fn rename_historizes_old_url() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    repo.set_content_name(node.content_id, "Goods")?;
    repo.publish_url_alias_for_location(node.node_id, "Goods", "eng-GB", false)?;

    assert_eq!(
        repo.translate("goods", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    assert_eq!(
        repo.translate("products", &langs(&["eng-GB"]))?,
        Resolved::Redirect {
            path: "goods".to_string()
        }
    );
    // Only one active entry remains for the location.
    let active = repo.list_url_aliases(node.node_id, false)?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].text, "goods");
    Ok(())
}

#[test]
fn freed_name_can_be_reused_by_another_location() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let first = publish_node(&repo, ROOT_NODE_ID, "News")?;
    repo.publish_url_alias_for_location(first.node_id, "Archive", "eng-GB", false)?;
    let second = publish_node(&repo, ROOT_NODE_ID, "News")?;

    // The newcomer owns the name; the old history entry loses the race.
    assert_eq!(
        repo.translate("news", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: second.node_id
        }
    );
    assert_eq!(
        repo.translate("archive", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: first.node_id
        }
    );
    Ok(())
}

#[test]
fn republishing_old_name_reactivates_it() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    repo.publish_url_alias_for_location(node.node_id, "Goods", "eng-GB", false)?;
    repo.publish_url_alias_for_location(node.node_id, "Products", "eng-GB", false)?;

    assert_eq!(
        repo.translate("products", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    assert_eq!(
        repo.translate("goods", &langs(&["eng-GB"]))?,
        Resolved::Redirect {
            path: "products".to_string()
        }
    );
    Ok(())
}

#[test]
fn translations_publish_without_destroying_each_other() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Office")?;
    repo.publish_url_alias_for_location(node.node_id, "Buro", "ger-DE", false)?;

    assert_eq!(
        repo.translate("office", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    assert_eq!(
        repo.translate("buro", &langs(&["ger-DE"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    assert_eq!(repo.list_url_aliases(node.node_id, false)?.len(), 2);
    Ok(())
}

#[test]
fn same_text_translations_share_one_entry() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Contact")?;
    repo.publish_url_alias_for_location(node.node_id, "Contact", "ger-DE", false)?;

    let active = repo.list_url_aliases(node.node_id, false)?;
    assert_eq!(active.len(), 1);
    let eng = repo.language_id("eng-GB")?;
    let ger = repo.language_id("ger-DE")?;
    assert!(active[0].lang_mask.contains(eng));
    assert!(active[0].lang_mask.contains(ger));
    Ok(())
}

#[test]
fn archiving_last_translation_of_entry_historizes_it() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Office")?;
    repo.publish_url_alias_for_location(node.node_id, "Buro", "ger-DE", false)?;
    repo.archive_url_aliases_for_deleted_translations(node.node_id, &langs(&["ger-DE"]))?;

    assert_eq!(
        repo.translate("office", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    // The German-only entry became history forwarding to the survivor.
    assert_eq!(
        repo.translate("buro", &langs(&["ger-DE"]))?,
        Resolved::Redirect {
            path: "office".to_string()
        }
    );
    assert_eq!(repo.list_url_aliases(node.node_id, false)?.len(), 1);
    Ok(())
}

#[test]
fn archiving_translation_of_shared_entry_only_drops_its_bit() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Contact")?;
    repo.publish_url_alias_for_location(node.node_id, "Contact", "ger-DE", false)?;
    repo.archive_url_aliases_for_deleted_translations(node.node_id, &langs(&["ger-DE"]))?;

    let active = repo.list_url_aliases(node.node_id, false)?;
    assert_eq!(active.len(), 1);
    let ger = repo.language_id("ger-DE")?;
    assert!(!active[0].lang_mask.contains(ger));
    assert_eq!(
        repo.translate("contact", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    Ok(())
}

#[test]
fn always_available_entry_matches_any_language() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node_in(&repo, ROOT_NODE_ID, "Impressum", "ger-DE", true)?;
    assert_eq!(
        repo.translate("impressum", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    Ok(())
}

#[test]
fn language_mismatch_is_not_found() -> Result<()> {
    let (_temp, repo) = new_store()?;
    publish_node_in(&repo, ROOT_NODE_ID, "Impressum", "ger-DE", false)?;
    let err = repo
        .translate("impressum", &langs(&["eng-GB"]))
        .unwrap_err();
    assert!(matches!(
        storage_err(&err),
        Some(StorageError::UrlNotFound(_))
    ));
    Ok(())
}

#[test]
fn sibling_name_conflict_retires_previous_owner() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let first = publish_node(&repo, ROOT_NODE_ID, "Team")?;
    let second = publish_node(&repo, ROOT_NODE_ID, "Team")?;

    assert_eq!(
        repo.translate("team", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: second.node_id
        }
    );
    // The first location has no active entry left, only history.
    assert!(repo.list_url_aliases(first.node_id, false)?.is_empty());
    Ok(())
}
