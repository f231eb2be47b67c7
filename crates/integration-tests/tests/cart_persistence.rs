//! Reloading the cart from the file store, as on a page reload.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rocketshoes_core::ProductId;
use rocketshoes_integration_tests::{MockBackend, ids};
use rocketshoes_storefront::cart::FileStorage;
use rocketshoes_storefront::cart::record::{Decoded, decode};
use rocketshoes_storefront::config::DEFAULT_STORAGE_KEY;
use rocketshoes_storefront::state::open_cart;

#[tokio::test]
async fn test_cart_survives_reopen() {
    let mut backend = MockBackend::start().await;
    for id in [1, 2] {
        backend.stock(id, 4).await;
        backend.product(id, &format!("Tênis {id}"), 139.9).await;
    }
    let dir = tempfile::tempdir().unwrap();
    let config = backend.storefront_config(dir.path());

    let cart = open_cart(&config, backend.client()).await;
    cart.add_product(ProductId::new(2)).await.unwrap();
    cart.add_product(ProductId::new(1)).await.unwrap();
    cart.update_product_amount(ProductId::new(2), 3).await.unwrap();
    let before = cart.cart();
    drop(cart);

    let reopened = open_cart(&config, backend.client()).await;
    let after = reopened.cart();

    assert_eq!(after, before);
    assert_eq!(
        ids(after.entries()),
        vec![ProductId::new(2), ProductId::new(1)]
    );
    assert_eq!(after.get(ProductId::new(2)).unwrap().amount, 3);
}

#[tokio::test]
async fn test_legacy_file_is_upgraded() {
    let backend = MockBackend::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = FileStorage::new(dir.path()).path_for(DEFAULT_STORAGE_KEY);
    std::fs::write(
        &path,
        r#"[{"id":1,"title":"Tênis de Caminhada Leve Confortável","price":179.9,"image":"https://example.com/1.jpg","amount":2}]"#,
    )
    .unwrap();

    let cart = open_cart(&backend.storefront_config(dir.path()), backend.client()).await;

    assert_eq!(cart.cart().item_count(), 2);
    let rewritten = std::fs::read_to_string(&path).unwrap();
    assert!(matches!(decode(&rewritten).unwrap(), Decoded::Current(_)));
}

#[tokio::test]
async fn test_malformed_file_gives_empty_cart() {
    let mut backend = MockBackend::start().await;
    backend.stock(5, 1).await;
    backend.product(5, "Tênis", 59.9).await;
    let dir = tempfile::tempdir().unwrap();
    let path = FileStorage::new(dir.path()).path_for(DEFAULT_STORAGE_KEY);
    std::fs::write(&path, "{\"version\":1,\"items\":[{\"id\":5,").unwrap();

    let cart = open_cart(&backend.storefront_config(dir.path()), backend.client()).await;
    assert!(cart.cart().is_empty());

    // The next commit replaces the unreadable data.
    cart.add_product(ProductId::new(5)).await.unwrap();
    let saved = decode(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved.into_entries()[0].id, ProductId::new(5));
}
