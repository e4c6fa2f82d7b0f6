//! End-to-end tests over the full stack: services → engine transaction →
//! lifecycle/recalculation → flags, ledgers, audit and notifications.

use chrono::{Duration, Utc};

use stockline_availability::ChangedEntities;
use stockline_catalog::{
    Addon, AddonId, AddonLink, BillOfMaterials, LocationAddon, LocationAddonId, LocationProduct,
    LocationProductId, MaterialRef, Requirement, Variant, VariantId,
};
use stockline_core::{AggregateId, DomainError, LocationId, UserId, WarehouseId};
use stockline_fulfillment::{AcceptedLine, RequestedLine, StockRequestStatus};
use stockline_orders::{Order, OrderId, OrderLine, OrderLineId, OrderLineStatus, OrderStatus};
use stockline_stock::{
    BatchStatus, Ingredient, IngredientId, Material, MaterialId, Provision, ProvisionBatch,
    ProvisionBatchId, ProvisionId, UnitOfMeasure,
};

use crate::engine::{EngineError, InMemoryEngine, WorldState};
use crate::notify::{InMemoryNotificationSink, Notification};
use crate::services::StocklineService;
use crate::InMemoryAuditSink;

type Service = StocklineService<InMemoryAuditSink, InMemoryNotificationSink>;

/// One location selling one variant that requires 5.0 units of a single
/// ingredient, with a matching warehouse material (shelf life 30 days).
struct Shop {
    service: Service,
    location: LocationId,
    warehouse: WarehouseId,
    ingredient_id: IngredientId,
    material_id: MaterialId,
    variant_id: VariantId,
    product_id: LocationProductId,
    actor: UserId,
}

fn shop(location_stock: f64, warehouse_stock: f64) -> Shop {
    let mut world = WorldState::new();
    let location = LocationId::new();
    let warehouse = WarehouseId::new();

    let ingredient = Ingredient {
        id: IngredientId::new(AggregateId::new()),
        name: "Whole milk".to_string(),
        unit: UnitOfMeasure::Milliliters,
    };
    let material = Material {
        id: MaterialId::new(AggregateId::new()),
        ingredient_id: ingredient.id,
        name: "Whole milk 1L".to_string(),
        shelf_life_days: 30,
        safety_threshold: 5.0,
    };
    let variant = Variant {
        id: VariantId::new(AggregateId::new()),
        name: "Latte M".to_string(),
        bom: BillOfMaterials::new(vec![Requirement {
            material: MaterialRef::Ingredient(ingredient.id),
            quantity: 5.0,
        }]),
        addons: vec![],
    };
    let product = LocationProduct {
        id: LocationProductId::new(AggregateId::new()),
        location_id: location,
        variant_id: variant.id,
        out_of_stock: false,
    };

    let ingredient_id = ingredient.id;
    let material_id = material.id;
    let variant_id = variant.id;
    let product_id = product.id;

    world.put_ingredient(ingredient);
    world.put_material(material);
    world.put_variant(variant);
    world.put_location_product(product);
    world.set_ingredient_stock(location, ingredient_id, location_stock, 2.0);
    world.set_warehouse_stock(warehouse, material_id, warehouse_stock);

    let service = StocklineService::new(
        InMemoryEngine::new(world),
        InMemoryAuditSink::new(),
        InMemoryNotificationSink::new(),
    );

    Shop {
        service,
        location,
        warehouse,
        ingredient_id,
        material_id,
        variant_id,
        product_id,
        actor: UserId::new(),
    }
}

fn pending_order(shop: &Shop) -> (Order, OrderLineId) {
    let line_id = OrderLineId::new(AggregateId::new());
    let order = Order {
        id: OrderId::new(AggregateId::new()),
        location_id: shop.location,
        status: OrderStatus::Pending,
        lines: vec![OrderLine {
            id: line_id,
            location_product_id: shop.product_id,
            status: OrderLineStatus::Pending,
            addons: vec![],
        }],
        created_at: Utc::now(),
    };
    (order, line_id)
}

fn product_flag(shop: &Shop) -> bool {
    shop.service
        .engine()
        .read(|w| w.location_products[&shop.product_id].out_of_stock)
        .unwrap()
}

#[test]
fn pending_order_flips_the_wrapper_out_of_stock() {
    // 5 units held, variant needs 5: in stock while nothing is reserved.
    let shop = shop(5.0, 0.0);
    let now = Utc::now();

    let outcome = shop
        .service
        .composition_changed(
            shop.location,
            &ChangedEntities::for_ingredients([shop.ingredient_id]),
            now,
        )
        .unwrap();
    assert!(outcome.products_in.contains(&shop.product_id));
    assert!(!product_flag(&shop));

    // A pending line reserves 5 more; 5 - 5 = 0 < 5.
    let (order, _) = pending_order(&shop);
    let outcome = shop.service.place_order(order, now).unwrap();
    assert_eq!(outcome.newly_out_products, vec![shop.product_id]);
    assert!(product_flag(&shop));

    // Post-commit notification for the flip.
    assert!(shop.service.notification_sink().sent().iter().any(|n| matches!(
        n,
        Notification::ProductOutOfStock { location_product_id, .. } if *location_product_id == shop.product_id
    )));
}

#[test]
fn completing_the_order_deducts_stock_and_releases_the_reservation() {
    let shop = shop(10.0, 0.0);
    let now = Utc::now();
    let (order, line_id) = pending_order(&shop);
    let order_id = order.id;
    shop.service.place_order(order, now).unwrap();

    shop.service.prepare_order_line(order_id, line_id).unwrap();
    shop.service
        .complete_order_line(order_id, line_id, now)
        .unwrap();

    let (stock, order_status) = shop
        .service
        .engine()
        .read(|w| {
            (
                w.ingredient_quantity(shop.location, shop.ingredient_id),
                w.orders[&order_id].status,
            )
        })
        .unwrap();
    assert_eq!(stock, 5.0);
    assert_eq!(order_status, OrderStatus::Completed);
    // 5 held, nothing reserved: back in stock.
    assert!(!product_flag(&shop));
}

#[test]
fn replenishment_happy_path_stamps_expiry_and_credits_the_location() {
    let shop = shop(0.0, 10.0);
    let now = Utc::now();

    let request = shop
        .service
        .create_stock_request(
            shop.location,
            shop.warehouse,
            &[RequestedLine {
                material_id: shop.material_id,
                quantity: 10.0,
            }],
            now,
        )
        .unwrap();

    shop.service.submit_request(request.id, shop.actor, now).unwrap();
    shop.service
        .begin_request_delivery(request.id, shop.actor, now)
        .unwrap();
    assert_eq!(
        shop.service
            .engine()
            .read(|w| w.warehouse_quantity(shop.warehouse, shop.material_id))
            .unwrap(),
        0.0
    );

    let delivered_at = now + Duration::hours(4);
    let outcome = shop
        .service
        .complete_request(request.id, shop.actor, delivered_at)
        .unwrap();

    assert_eq!(outcome.request.status, StockRequestStatus::Completed);
    assert_eq!(outcome.request.lines[0].delivered_at, Some(delivered_at));
    assert_eq!(
        outcome.request.lines[0].expires_at,
        Some(delivered_at + Duration::days(30))
    );
    assert_eq!(
        shop.service
            .engine()
            .read(|w| w.ingredient_quantity(shop.location, shop.ingredient_id))
            .unwrap(),
        10.0
    );

    // Every transition left an audit record.
    let operations: Vec<&'static str> = shop
        .service
        .audit_sink()
        .records()
        .iter()
        .map(|r| r.operation)
        .collect();
    assert_eq!(operations, vec!["submit", "begin_delivery", "complete"]);
}

#[test]
fn reconciliation_returns_the_shortfall_and_logs_the_change() {
    let shop = shop(0.0, 10.0);
    let now = Utc::now();

    let request = shop
        .service
        .create_stock_request(
            shop.location,
            shop.warehouse,
            &[RequestedLine {
                material_id: shop.material_id,
                quantity: 10.0,
            }],
            now,
        )
        .unwrap();
    shop.service.submit_request(request.id, shop.actor, now).unwrap();
    shop.service
        .begin_request_delivery(request.id, shop.actor, now)
        .unwrap();

    let outcome = shop
        .service
        .accept_request_with_change(
            request.id,
            &[AcceptedLine {
                material_id: shop.material_id,
                quantity: 6.0,
            }],
            Some("four cartons damaged in transit"),
            shop.actor,
            now,
        )
        .unwrap();

    assert_eq!(outcome.request.status, StockRequestStatus::AcceptedWithChange);
    assert_eq!(outcome.request.change_log.len(), 1);
    assert_eq!(outcome.request.change_log[0].requested_quantity, Some(10.0));
    assert_eq!(outcome.request.change_log[0].actual_quantity, 6.0);

    let (warehouse, location) = shop
        .service
        .engine()
        .read(|w| {
            (
                w.warehouse_quantity(shop.warehouse, shop.material_id),
                w.ingredient_quantity(shop.location, shop.ingredient_id),
            )
        })
        .unwrap();
    assert_eq!(warehouse, 4.0);
    assert_eq!(location, 6.0);
}

#[test]
fn a_second_open_request_is_refused() {
    let shop = shop(0.0, 10.0);
    let now = Utc::now();
    let lines = [RequestedLine {
        material_id: shop.material_id,
        quantity: 1.0,
    }];

    shop.service
        .create_stock_request(shop.location, shop.warehouse, &lines, now)
        .unwrap();
    let err = shop
        .service
        .create_stock_request(shop.location, shop.warehouse, &lines, now + Duration::days(2))
        .expect_err("open request already exists");
    assert!(matches!(err, EngineError::Domain(DomainError::Conflict(_))));
}

#[test]
fn open_stock_request_tracks_the_locations_current_request() {
    let shop = shop(0.0, 10.0);
    let now = Utc::now();

    assert_eq!(shop.service.open_stock_request(shop.location).unwrap(), None);

    let request = shop
        .service
        .create_stock_request(
            shop.location,
            shop.warehouse,
            &[RequestedLine {
                material_id: shop.material_id,
                quantity: 10.0,
            }],
            now,
        )
        .unwrap();
    let open = shop
        .service
        .open_stock_request(shop.location)
        .unwrap()
        .expect("just created");
    assert_eq!(open.id, request.id);

    // Other locations see nothing.
    assert_eq!(shop.service.open_stock_request(LocationId::new()).unwrap(), None);

    // Once the request reaches a terminal status it is no longer open.
    shop.service.submit_request(request.id, shop.actor, now).unwrap();
    shop.service
        .begin_request_delivery(request.id, shop.actor, now)
        .unwrap();
    shop.service.complete_request(request.id, shop.actor, now).unwrap();
    assert_eq!(shop.service.open_stock_request(shop.location).unwrap(), None);
}

#[test]
fn expired_provision_batches_do_not_count() {
    let mut world = WorldState::new();
    let location = LocationId::new();
    let now = Utc::now();

    let provision = Provision {
        id: ProvisionId::new(AggregateId::new()),
        name: "Vanilla syrup base".to_string(),
        unit: UnitOfMeasure::Milliliters,
    };
    let variant = Variant {
        id: VariantId::new(AggregateId::new()),
        name: "Vanilla latte M".to_string(),
        bom: BillOfMaterials::new(vec![Requirement {
            material: MaterialRef::Provision(provision.id),
            quantity: 30.0,
        }]),
        addons: vec![],
    };
    let product = LocationProduct {
        id: LocationProductId::new(AggregateId::new()),
        location_id: location,
        variant_id: variant.id,
        out_of_stock: false,
    };
    let provision_id = provision.id;
    let product_id = product.id;

    world.put_provision(provision);
    world.put_variant(variant);
    world.put_location_product(product);
    // Completed but expired an hour ago: nonzero volume that must not count.
    world.put_batch(ProvisionBatch {
        id: ProvisionBatchId::new(AggregateId::new()),
        location_id: location,
        provision_id,
        volume: 500.0,
        status: BatchStatus::Completed,
        expires_at: Some(now - Duration::hours(1)),
        created_at: now - Duration::days(2),
    });

    let service: Service = StocklineService::new(
        InMemoryEngine::new(world),
        InMemoryAuditSink::new(),
        InMemoryNotificationSink::new(),
    );

    let outcome = service
        .composition_changed(location, &ChangedEntities::for_provisions([provision_id]), now)
        .unwrap();
    assert!(outcome.products_out.contains(&product_id));

    // A fresh batch brings the wrapper back.
    let outcome = service
        .receive_provision_batch(
            ProvisionBatch {
                id: ProvisionBatchId::new(AggregateId::new()),
                location_id: location,
                provision_id,
                volume: 200.0,
                status: BatchStatus::Completed,
                expires_at: Some(now + Duration::days(1)),
                created_at: now,
            },
            now,
        )
        .unwrap();
    assert!(outcome.products_in.contains(&product_id));
}

#[test]
fn insufficient_warehouse_stock_rolls_the_whole_transition_back() {
    let shop = shop(0.0, 4.0);
    let now = Utc::now();

    let request = shop
        .service
        .create_stock_request(
            shop.location,
            shop.warehouse,
            &[RequestedLine {
                material_id: shop.material_id,
                quantity: 10.0,
            }],
            now,
        )
        .unwrap();
    shop.service.submit_request(request.id, shop.actor, now).unwrap();

    let err = shop
        .service
        .begin_request_delivery(request.id, shop.actor, now)
        .expect_err("10 requested, 4 held");
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::InsufficientStock(_))
    ));

    let (status, warehouse) = shop
        .service
        .engine()
        .read(|w| {
            (
                w.stock_requests[&request.id].status,
                w.warehouse_quantity(shop.warehouse, shop.material_id),
            )
        })
        .unwrap();
    assert_eq!(status, StockRequestStatus::Processed);
    assert_eq!(warehouse, 4.0);
}

#[test]
fn recalculation_is_idempotent_over_flags() {
    let shop = shop(2.0, 0.0);
    let now = Utc::now();
    let changed = ChangedEntities::for_ingredients([shop.ingredient_id]);

    let first = shop.service.composition_changed(shop.location, &changed, now).unwrap();
    assert_eq!(first.newly_out_products, vec![shop.product_id]);

    let second = shop.service.composition_changed(shop.location, &changed, now).unwrap();
    assert!(second.newly_out_products.is_empty());
    assert_eq!(second.products_out, first.products_out);
    assert!(product_flag(&shop));
}

#[test]
fn warehouse_safety_threshold_notification_fires_after_delivery_starts() {
    // Safety threshold for the material is 5.0; 10 - 8 = 2 < 5.
    let shop = shop(0.0, 10.0);
    let now = Utc::now();

    let request = shop
        .service
        .create_stock_request(
            shop.location,
            shop.warehouse,
            &[RequestedLine {
                material_id: shop.material_id,
                quantity: 8.0,
            }],
            now,
        )
        .unwrap();
    shop.service.submit_request(request.id, shop.actor, now).unwrap();
    shop.service
        .begin_request_delivery(request.id, shop.actor, now)
        .unwrap();

    assert!(shop.service.notification_sink().sent().iter().any(|n| matches!(
        n,
        Notification::WarehouseBelowSafetyThreshold { material_id, quantity, .. }
            if *material_id == shop.material_id && *quantity == 2.0
    )));
}

#[test]
fn low_ingredient_stock_notification_fires_on_order_completion() {
    // Threshold 2.0 in the fixture; 6 - 5 = 1 <= 2.
    let shop = shop(6.0, 0.0);
    let now = Utc::now();
    let (order, line_id) = pending_order(&shop);
    let order_id = order.id;
    shop.service.place_order(order, now).unwrap();
    shop.service
        .complete_order_line(order_id, line_id, now)
        .unwrap();

    assert!(shop.service.notification_sink().sent().iter().any(|n| matches!(
        n,
        Notification::LowIngredientStock { ingredient_id, quantity, .. }
            if *ingredient_id == shop.ingredient_id && *quantity == 1.0
    )));
}

#[test]
fn default_addon_gates_the_parent_product_wrapper() {
    let mut world = WorldState::new();
    let location = LocationId::new();
    let now = Utc::now();

    let topping_ingredient = IngredientId::new(AggregateId::new());
    let addon = Addon {
        id: AddonId::new(AggregateId::new()),
        name: "Whipped cream".to_string(),
        bom: BillOfMaterials::new(vec![Requirement {
            material: MaterialRef::Ingredient(topping_ingredient),
            quantity: 10.0,
        }]),
    };
    let variant = Variant {
        id: VariantId::new(AggregateId::new()),
        name: "Mocha M".to_string(),
        bom: BillOfMaterials::default(),
        addons: vec![AddonLink {
            addon_id: addon.id,
            is_default: true,
        }],
    };
    let product = LocationProduct {
        id: LocationProductId::new(AggregateId::new()),
        location_id: location,
        variant_id: variant.id,
        out_of_stock: false,
    };
    let location_addon = LocationAddon {
        id: LocationAddonId::new(AggregateId::new()),
        location_id: location,
        addon_id: addon.id,
        out_of_stock: false,
    };
    let addon_id = addon.id;
    let product_id = product.id;
    let location_addon_id = location_addon.id;

    world.put_addon(addon);
    world.put_variant(variant);
    world.put_location_product(product);
    world.put_location_addon(location_addon);
    // No stock at all for the topping.

    let service: Service = StocklineService::new(
        InMemoryEngine::new(world),
        InMemoryAuditSink::new(),
        InMemoryNotificationSink::new(),
    );

    let outcome = service
        .composition_changed(location, &ChangedEntities::for_addons([addon_id]), now)
        .unwrap();
    // Both the add-on wrapper and its host product flip.
    assert!(outcome.addons_out.contains(&location_addon_id));
    assert!(outcome.products_out.contains(&product_id));
}

/// A variant requiring 30.0 of a provision, one pending order line already
/// placed, and one completed unexpired batch per entry in `volumes`
/// (index 0 is the oldest).
struct SyrupShop {
    service: Service,
    order_id: OrderId,
    line_id: OrderLineId,
    batch_ids: Vec<ProvisionBatchId>,
}

fn syrup_shop(volumes: &[f64]) -> SyrupShop {
    let mut world = WorldState::new();
    let location = LocationId::new();
    let now = Utc::now();

    let provision = Provision {
        id: ProvisionId::new(AggregateId::new()),
        name: "Vanilla syrup base".to_string(),
        unit: UnitOfMeasure::Milliliters,
    };
    let variant = Variant {
        id: VariantId::new(AggregateId::new()),
        name: "Vanilla latte M".to_string(),
        bom: BillOfMaterials::new(vec![Requirement {
            material: MaterialRef::Provision(provision.id),
            quantity: 30.0,
        }]),
        addons: vec![],
    };
    let product = LocationProduct {
        id: LocationProductId::new(AggregateId::new()),
        location_id: location,
        variant_id: variant.id,
        out_of_stock: false,
    };
    let provision_id = provision.id;
    let product_id = product.id;

    world.put_provision(provision);
    world.put_variant(variant);
    world.put_location_product(product);

    let mut batch_ids = Vec::new();
    for (i, volume) in volumes.iter().enumerate() {
        let id = ProvisionBatchId::new(AggregateId::new());
        world.put_batch(ProvisionBatch {
            id,
            location_id: location,
            provision_id,
            volume: *volume,
            status: BatchStatus::Completed,
            expires_at: Some(now + Duration::days(7)),
            created_at: now - Duration::days((volumes.len() - i) as i64),
        });
        batch_ids.push(id);
    }

    let service: Service = StocklineService::new(
        InMemoryEngine::new(world),
        InMemoryAuditSink::new(),
        InMemoryNotificationSink::new(),
    );

    let line_id = OrderLineId::new(AggregateId::new());
    let order = Order {
        id: OrderId::new(AggregateId::new()),
        location_id: location,
        status: OrderStatus::Pending,
        lines: vec![OrderLine {
            id: line_id,
            location_product_id: product_id,
            status: OrderLineStatus::Pending,
            addons: vec![],
        }],
        created_at: now,
    };
    let order_id = order.id;
    service.place_order(order, now).unwrap();

    SyrupShop {
        service,
        order_id,
        line_id,
        batch_ids,
    }
}

#[test]
fn completing_an_order_line_drains_provision_batches_oldest_first() {
    let shop = syrup_shop(&[30.0, 80.0]);

    shop.service
        .complete_order_line(shop.order_id, shop.line_id, Utc::now())
        .unwrap();

    let batches: Vec<(f64, BatchStatus)> = shop
        .service
        .engine()
        .read(|w| {
            shop.batch_ids
                .iter()
                .map(|id| (w.provision_batches[id].volume, w.provision_batches[id].status))
                .collect()
        })
        .unwrap();
    // 30.0 required: the older batch is consumed entirely and marked
    // empty, the newer one is untouched.
    assert_eq!(batches[0], (0.0, BatchStatus::Empty));
    assert_eq!(batches[1], (80.0, BatchStatus::Completed));
}

#[test]
fn short_provision_volume_rolls_the_line_completion_back() {
    let shop = syrup_shop(&[20.0]);

    let err = shop
        .service
        .complete_order_line(shop.order_id, shop.line_id, Utc::now())
        .expect_err("30 required, 20 eligible");
    assert!(matches!(
        err,
        EngineError::Domain(DomainError::InsufficientStock(_))
    ));

    // Nothing committed: batch volume and line status are unchanged.
    let (volume, status, line_status) = shop
        .service
        .engine()
        .read(|w| {
            let batch = &w.provision_batches[&shop.batch_ids[0]];
            (batch.volume, batch.status, w.orders[&shop.order_id].lines[0].status)
        })
        .unwrap();
    assert_eq!(volume, 20.0);
    assert_eq!(status, BatchStatus::Completed);
    assert_eq!(line_status, OrderLineStatus::Pending);
}

#[test]
fn concurrent_completions_serialize_on_the_engine() {
    use std::sync::Arc;

    let shop = shop(10.0, 0.0);
    let now = Utc::now();

    let mut order_handles = Vec::new();
    for _ in 0..2 {
        let (order, line_id) = pending_order(&shop);
        let order_id = order.id;
        shop.service.place_order(order, now).unwrap();
        order_handles.push((order_id, line_id));
    }

    let service = Arc::new(shop.service);
    std::thread::scope(|scope| {
        for (order_id, line_id) in order_handles {
            let service = Arc::clone(&service);
            scope.spawn(move || {
                service.complete_order_line(order_id, line_id, now).unwrap();
            });
        }
    });

    let stock = service
        .engine()
        .read(|w| w.ingredient_quantity(shop.location, shop.ingredient_id))
        .unwrap();
    assert_eq!(stock, 0.0);
}
