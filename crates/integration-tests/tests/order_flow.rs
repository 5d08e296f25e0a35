//! Integration tests for admin order management.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (sk-cli migrate)
//! - The web server running against it (cargo run -p storekeep-web)
//!
//! Run with: cargo test -p storekeep-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};

use storekeep_core::{CustomerId, OrderStatus};
use storekeep_integration_tests::{
    TEST_PASSWORD, TestContext, client, location, login, unique_name,
};
use storekeep_web::db::{CustomerRepository, OrderRepository};

/// Log in a fresh admin and create a fresh customer without a login.
async fn admin_with_customer(ctx: &TestContext) -> (Client, CustomerId, String) {
    let client = client();
    let admin = ctx.create_admin().await;
    let resp = login(ctx, &client, &admin, TEST_PASSWORD).await;
    assert_eq!(location(&resp), "/");

    let name = unique_name("buyer");
    let customer = CustomerRepository::new(&ctx.pool)
        .create(&name, Some("555-0199"), None)
        .await
        .unwrap();
    (client, customer.id, name)
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_formset_creates_only_filled_rows() {
    let ctx = TestContext::new().await;
    let (client, customer_id, name) = admin_with_customer(&ctx).await;
    let (product_id, _) = ctx.create_product().await;
    let product = product_id.to_string();

    let resp = client
        .post(ctx.url(&format!("/create_order/{customer_id}")))
        .form(&[
            ("form-TOTAL_FORMS", "3"),
            ("form-INITIAL_FORMS", "0"),
            ("form-0-product", product.as_str()),
            ("form-0-status", "pending"),
            ("form-1-product", product.as_str()),
            ("form-1-status", "delivered"),
            ("form-2-product", ""),
            ("form-2-status", ""),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let orders = OrderRepository::new(&ctx.pool)
        .list_for_customer(customer_id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().any(|o| o.status == OrderStatus::Delivered));

    ctx.cleanup_customer(&name).await;
    ctx.cleanup_product(product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_formset_with_bad_row_saves_nothing() {
    let ctx = TestContext::new().await;
    let (client, customer_id, name) = admin_with_customer(&ctx).await;
    let (product_id, _) = ctx.create_product().await;
    let product = product_id.to_string();

    let resp = client
        .post(ctx.url(&format!("/create_order/{customer_id}")))
        .form(&[
            ("form-TOTAL_FORMS", "2"),
            ("form-INITIAL_FORMS", "0"),
            ("form-0-product", product.as_str()),
            ("form-0-status", "pending"),
            ("form-1-product", product.as_str()),
            ("form-1-status", "lost"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let orders = OrderRepository::new(&ctx.pool)
        .list_for_customer(customer_id)
        .await
        .unwrap();
    assert!(orders.is_empty());

    ctx.cleanup_customer(&name).await;
    ctx.cleanup_product(product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_update_then_delete_order() {
    let ctx = TestContext::new().await;
    let (client, customer_id, name) = admin_with_customer(&ctx).await;
    let (product_id, _) = ctx.create_product().await;

    let ids = OrderRepository::new(&ctx.pool)
        .create_many(customer_id, &[(product_id, OrderStatus::Pending)])
        .await
        .unwrap();
    let order_id = ids.first().copied().unwrap();

    let resp = client
        .post(ctx.url(&format!("/update_order/{order_id}/")))
        .form(&[
            ("customer", customer_id.to_string().as_str()),
            ("product", product_id.to_string().as_str()),
            ("status", "out_for_delivery"),
            ("note", "left at the door"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");

    let order = OrderRepository::new(&ctx.pool).get(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::OutForDelivery);
    assert_eq!(order.note.as_deref(), Some("left at the door"));

    // Confirmation page first, then the delete itself
    let resp = client
        .get(ctx.url(&format!("/delete_order/{order_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(ctx.url(&format!("/delete_order/{order_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");
    assert!(OrderRepository::new(&ctx.pool).get(order_id).await.unwrap().is_none());

    let resp = client
        .post(ctx.url(&format!("/delete_order/{order_id}/")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    ctx.cleanup_customer(&name).await;
    ctx.cleanup_product(product_id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_customer_page_filters_by_status() {
    let ctx = TestContext::new().await;
    let (client, customer_id, name) = admin_with_customer(&ctx).await;
    let (product_id, _) = ctx.create_product().await;

    OrderRepository::new(&ctx.pool)
        .create_many(
            customer_id,
            &[
                (product_id, OrderStatus::Pending),
                (product_id, OrderStatus::Delivered),
            ],
        )
        .await
        .unwrap();

    let resp = client
        .get(ctx.url(&format!("/customer/{customer_id}/?status=delivered")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains(&name));
    assert!(!body.contains("Enter a valid"));

    let resp = client
        .get(ctx.url(&format!("/customer/{customer_id}/?start_date=someday")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Enter a valid date."));

    let resp = client
        .get(ctx.url("/customer/999999999/"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    ctx.cleanup_customer(&name).await;
    ctx.cleanup_product(product_id).await;
}
