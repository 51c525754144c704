//! Record reconciliation tests

use catalog_sync::services::reconcile;
use std::fmt::Write;

const SCENARIO: &str = r#"{"id":"p1","title":"Shirt"}
{"namespace":"custom","key":"color","value":"red","__parentId":"p1"}
{"id":"p2","title":"Hat"}
"#;

#[tokio::test]
async fn scenario_attaches_metafield_to_its_parent() {
    let catalog = reconcile(SCENARIO.as_bytes()).await.unwrap();

    assert_eq!(catalog.products.len(), 2);

    let shirt = &catalog.products[0];
    assert_eq!(shirt.id, "p1");
    assert_eq!(shirt.title, "Shirt");
    assert_eq!(shirt.metafields.len(), 1);
    assert_eq!(shirt.metafields[0].namespace, "custom");
    assert_eq!(shirt.metafields[0].key, "color");
    assert_eq!(shirt.metafields[0].value, "red");

    let hat = &catalog.products[1];
    assert_eq!(hat.id, "p2");
    assert!(hat.metafields.is_empty());
}

/// Interleaved file: every product followed by `i % 4` metafields, plus
/// metafields pointing at products that never appear.
fn generated_file(products: usize) -> (String, usize, usize) {
    let mut file = String::new();
    let mut attached = 0;
    let mut orphans = 0;

    for i in 0..products {
        writeln!(file, r#"{{"id":"gid://shopify/Product/{}","title":"Product {}"}}"#, i, i).unwrap();
        for m in 0..(i % 4) {
            writeln!(
                file,
                r#"{{"namespace":"custom","key":"k{}","value":"v{}-{}","__parentId":"gid://shopify/Product/{}"}}"#,
                m, i, m, i
            )
            .unwrap();
            attached += 1;
        }
        if i % 7 == 0 {
            writeln!(
                file,
                r#"{{"namespace":"custom","key":"lost","value":"x","__parentId":"gid://shopify/Product/missing-{}"}}"#,
                i
            )
            .unwrap();
            orphans += 1;
        }
    }

    (file, attached, orphans)
}

#[tokio::test]
async fn every_metafield_lands_on_exactly_its_product() {
    let (file, attached, orphans) = generated_file(50);
    let catalog = reconcile(file.as_bytes()).await.unwrap();

    assert_eq!(catalog.products.len(), 50);
    assert_eq!(catalog.orphaned_metafields, orphans);

    let total: usize = catalog.products.iter().map(|p| p.metafields.len()).sum();
    assert_eq!(total, attached);

    for (i, product) in catalog.products.iter().enumerate() {
        assert_eq!(product.id, format!("gid://shopify/Product/{}", i));
        assert_eq!(product.metafields.len(), i % 4);
        for (m, metafield) in product.metafields.iter().enumerate() {
            assert_eq!(metafield.key, format!("k{}", m));
            assert_eq!(metafield.value, format!("v{}-{}", i, m));
        }
    }
}

#[tokio::test]
async fn reconciliation_is_deterministic() {
    let (file, _, _) = generated_file(20);

    let first = reconcile(file.as_bytes()).await.unwrap();
    let second = reconcile(file.as_bytes()).await.unwrap();

    assert_eq!(
        serde_json::to_string(&first.products).unwrap(),
        serde_json::to_string(&second.products).unwrap()
    );
}

#[tokio::test]
async fn malformed_lines_are_skipped_and_counted() {
    let input = concat!(
        "{\"id\":\"p1\",\"title\":\"Shirt\"}\n",
        "{not json}\n",
        "{\"id\":\"p2\",\"tags\":\"should-be-a-list\"}\n",
        "{\"namespace\":\"custom\",\"key\":\"k\",\"value\":\"v\",\"__parentId\":\"p1\"}\n",
    );

    let catalog = reconcile(input.as_bytes()).await.unwrap();

    assert_eq!(catalog.skipped_lines, 2);
    assert_eq!(catalog.products.len(), 1);
    assert_eq!(catalog.products[0].metafields.len(), 1);
}

#[tokio::test]
async fn duplicate_product_keeps_first_record() {
    let input = concat!(
        "{\"id\":\"p1\",\"title\":\"First\"}\n",
        "{\"id\":\"p1\",\"title\":\"Second\"}\n",
        "{\"namespace\":\"custom\",\"key\":\"k\",\"value\":\"v\",\"__parentId\":\"p1\"}\n",
    );

    let catalog = reconcile(input.as_bytes()).await.unwrap();

    assert_eq!(catalog.products.len(), 1);
    assert_eq!(catalog.products[0].title, "First");
    assert_eq!(catalog.products[0].metafields.len(), 1);
    assert_eq!(catalog.duplicate_products, 1);
}

#[tokio::test]
async fn crlf_line_endings_are_accepted() {
    let input = "{\"id\":\"p1\"}\r\n{\"namespace\":\"n\",\"key\":\"k\",\"value\":\"v\",\"__parentId\":\"p1\"}\r\n";
    let catalog = reconcile(input.as_bytes()).await.unwrap();

    assert_eq!(catalog.skipped_lines, 0);
    assert_eq!(catalog.products[0].metafields.len(), 1);
}
