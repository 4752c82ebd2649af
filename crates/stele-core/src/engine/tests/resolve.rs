//! URL translation edge cases.

use super::*;

#[test]
fn empty_url_is_the_tree_root() -> Result<()> {
    let (_temp, repo) = new_store()?;
    for url in ["", "/", "//"] {
        assert_eq!(
            repo.translate(url, &langs(&["eng-GB"]))?,
            Resolved::Location {
                node_id: ROOT_NODE_ID
            }
        );
    }
    Ok(())
}

#[test]
fn translation_descends_multiple_levels() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let products = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let widgets = publish_node(&repo, products.node_id, "Widgets")?;
    let red = publish_node(&repo, widgets.node_id, "Red")?;

    assert_eq!(
        repo.translate("/products/widgets/red/", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: red.node_id
        }
    );
    assert_eq!(
        repo.load_autogenerated_path(red.node_id, &langs(&["eng-GB"]))?,
        "products/widgets/red"
    );
    Ok(())
}

#[test]
fn lookup_hash_is_case_insensitive() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let node = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    assert_eq!(
        repo.translate("PRODUCTS", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: node.node_id
        }
    );
    Ok(())
}

#[test]
fn unknown_url_is_not_found() -> Result<()> {
    let (_temp, repo) = new_store()?;
    publish_node(&repo, ROOT_NODE_ID, "Products")?;
    for url in ["missing", "products/missing"] {
        let err = repo.translate(url, &langs(&["eng-GB"])).unwrap_err();
        assert!(matches!(
            storage_err(&err),
            Some(StorageError::UrlNotFound(_))
        ));
    }
    Ok(())
}

#[test]
fn descendants_of_renamed_ancestor_resolve_under_new_name() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let products = publish_node(&repo, ROOT_NODE_ID, "Products")?;
    let widgets = publish_node(&repo, products.node_id, "Widgets")?;
    repo.publish_url_alias_for_location(products.node_id, "Goods", "eng-GB", false)?;

    assert_eq!(
        repo.translate("goods/widgets", &langs(&["eng-GB"]))?,
        Resolved::Location {
            node_id: widgets.node_id
        }
    );
    // The old ancestor segment still reaches the child, as a redirect.
    assert_eq!(
        repo.translate("products/widgets", &langs(&["eng-GB"]))?,
        Resolved::Redirect {
            path: "goods/widgets".to_string()
        }
    );
    Ok(())
}

#[test]
fn broken_parent_chain_reports_last_good_portion() -> Result<()> {
    let (_temp, repo) = new_store()?;
    let eng = repo.language_id("eng-GB")?;
    let orphan = repo.insert_alias(NewAliasRow::custom(
        AliasId(424_242),
        "stranded",
        Action::Module("content/view".to_string()),
        LanguageMask::indicator(eng, false),
        false,
    ))?;
    let err = repo.load_alias_path(orphan.id).unwrap_err();
    match storage_err(&err) {
        Some(StorageError::BrokenPath { id, last_good }) => {
            assert_eq!(*id, orphan.id.raw());
            assert_eq!(last_good, "stranded");
        }
        other => panic!("expected broken path error, got {other:?}"),
    }
    Ok(())
}
