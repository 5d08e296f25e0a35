//! Seed the database with a small demo catalog.
//!
//! Creates a few tags, products, customers and orders so a fresh install has
//! something to show on the dashboards. Does nothing if any customer exists.

use tracing::info;

use storekeep_core::{OrderStatus, Price, ProductCategory, ProductId};
use storekeep_web::db::{CustomerRepository, OrderRepository, ProductRepository};

use super::{CliError, connect};

struct DemoProduct {
    name: &'static str,
    cents: u32,
    category: ProductCategory,
    description: &'static str,
    tags: &'static [&'static str],
}

const TAGS: [&str; 3] = ["Sports", "Kitchen", "Summer"];

const PRODUCTS: [DemoProduct; 4] = [
    DemoProduct {
        name: "Ball",
        cents: 1_999,
        category: ProductCategory::OutDoor,
        description: "Regulation size football.",
        tags: &["Sports", "Summer"],
    },
    DemoProduct {
        name: "BBQ Grill",
        cents: 18_900,
        category: ProductCategory::OutDoor,
        description: "Charcoal grill with a lid.",
        tags: &["Kitchen", "Summer"],
    },
    DemoProduct {
        name: "Kitchen Mat",
        cents: 2_450,
        category: ProductCategory::Indoor,
        description: "Anti-fatigue floor mat.",
        tags: &["Kitchen"],
    },
    DemoProduct {
        name: "Yoga Block",
        cents: 1_200,
        category: ProductCategory::Indoor,
        description: "",
        tags: &["Sports"],
    },
];

const CUSTOMERS: [(&str, &str, &str); 3] = [
    ("Peter Piper", "555-0100", "peter@example.com"),
    ("John Doe", "555-0101", "john@example.com"),
    ("Sara Lee", "555-0102", "sara@example.com"),
];

/// Orders as (customer index, product index, status).
const ORDERS: [(usize, usize, OrderStatus); 5] = [
    (0, 0, OrderStatus::Delivered),
    (0, 1, OrderStatus::Pending),
    (1, 2, OrderStatus::OutForDelivery),
    (1, 0, OrderStatus::Pending),
    (2, 3, OrderStatus::Delivered),
];

/// Insert the demo data.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn demo() -> Result<(), CliError> {
    let pool = connect().await?;
    let customers = CustomerRepository::new(&pool);

    if customers.count().await? > 0 {
        info!("Customers already exist; skipping seed");
        return Ok(());
    }

    let products = ProductRepository::new(&pool);
    for tag in TAGS {
        products.ensure_tag(tag).await?;
    }

    let mut product_ids: Vec<ProductId> = Vec::with_capacity(PRODUCTS.len());
    for product in &PRODUCTS {
        let tags: Vec<String> = product.tags.iter().map(|t| (*t).to_owned()).collect();
        let description = (!product.description.is_empty()).then_some(product.description);
        let id = products
            .create(
                product.name,
                Price::from_cents(product.cents),
                product.category,
                description,
                &tags,
            )
            .await?;
        product_ids.push(id);
    }
    info!(count = product_ids.len(), "Products created");

    let mut customer_ids = Vec::with_capacity(CUSTOMERS.len());
    for (name, phone, email) in CUSTOMERS {
        let customer = customers.create(name, Some(phone), Some(email)).await?;
        customer_ids.push(customer.id);
    }
    info!(count = customer_ids.len(), "Customers created");

    let orders = OrderRepository::new(&pool);
    for (customer, product, status) in ORDERS {
        let (Some(&customer_id), Some(&product_id)) =
            (customer_ids.get(customer), product_ids.get(product))
        else {
            continue;
        };
        orders.create_many(customer_id, &[(product_id, status)]).await?;
    }
    info!(count = ORDERS.len(), "Orders created");

    Ok(())
}
