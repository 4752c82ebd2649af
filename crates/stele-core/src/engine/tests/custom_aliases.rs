//! User-authored aliases and the NOP placeholders beneath them.

use super::*;

#[test]
fn custom_alias_resolves_in_place() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    repo.create_custom_url_alias(node.node_id, "shop", "eng-GB", false, false)?;
    assert_eq!(
        repo.translate("shop", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    Ok(())
}

#[test]
fn forwarding_alias_redirects_to_canonical_url() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    repo.create_custom_url_alias(node.node_id, "shop", "eng-GB", true, false)?;
    assert_eq!(
        repo.translate("shop", &langs(&["eng-GB"]))?,
        Resolved::Redirect {
            path: "products".to_string()
        }
    );
    Ok(())
}

#[test]
fn nested_alias_path_fills_gaps_with_placeholders() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    repo.create_custom_url_alias(node.node_id, "promo/summer/sale", "eng-GB", false, false)?;

    assert_eq!(
        repo.translate("promo/summer/sale", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    // Placeholder levels are branch points, not addressable endpoints.
    for url in ["promo", "promo/summer"] {
        let err = repo.translate(url, &langs(&["eng-GB"])).unwrap_err();
        assert!(matches!(
            storage_err(&err),
            Some(StorageError::UrlNotFound(_))
        ));
    }
    Ok(())
}

#[test]
fn global_alias_targets_a_resource() -> Result<()> {
    let (_temp, repo) = new_store()?;
    repo.create_global_url_alias("content/search", "find", "eng-GB", false, false)?;
    assert_eq!(
        repo.translate("find", &langs(&["eng-GB"]))?,
        Resolved::Resource {
            resource: "content/search".to_string()
        }
    );
    Ok(())
}

#[test]
fn occupied_slot_rejects_new_alias() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let products = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let other = publish_node(&repo, ROOT_NODE_ID, "Other")?;
    let err = repo
        .create_custom_url_alias(other.node_id, "products", "eng-GB", false, false)
        .unwrap_err();
    assert!(matches!(
        storage_err(&err),
        Some(StorageError::InvalidAliasPath(..))
    ));
    // The autogenerated owner is untouched.
    assert_eq!(
        repo.translate("products", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: products.node_id
        }
    );
    Ok(())
}

#[test]
fn custom_alias_keeps_slot_against_autogenerated_names() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    repo.create_custom_url_alias(node.node_id, "promo", "eng-GB", false, false)?;
    // A sibling named like the alias steps aside with a suffix.
    let rival = publish_node(&repo, ROOT_NODE_ID, "Promo")?;
    assert_eq!(
        repo.translate("promo", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    assert_eq!(
        repo.translate("promo2", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: rival.node_id
        }
    );
    Ok(())
}

#[test]
fn removing_alias_with_children_leaves_a_placeholder() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let outer = repo.create_custom_url_alias(node.node_id, "promo", "eng-GB", false, false)?;
    repo.create_custom_url_alias(node.node_id, "promo/sale", "eng-GB", false, false)?;

    repo.remove_custom_url_alias(outer.id)?;
    // The child still resolves through the placeholder left behind.
    assert_eq!(
        repo.translate("promo/sale", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    let err = repo.translate("promo", &langs(&["eng-GB"])).unwrap_err();
    assert!(matches!(
        storage_err(&err),
        Some(StorageError::UrlNotFound(_))
    ));
    Ok(())
}

#[test]
fn removing_childless_alias_deletes_the_entry() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let alias = repo.create_custom_url_alias(node.node_id, "shop", "eng-GB", false, false)?;
    repo.remove_custom_url_alias(alias.id)?;
    let err = repo.translate("shop", &langs(&["eng-GB"])).unwrap_err();
    assert!(matches!(
        storage_err(&err),
        Some(StorageError::UrlNotFound(_))
    ));
    assert!(repo.list_url_aliases(node.node_id, true)?.is_empty());
    Ok(())
}
