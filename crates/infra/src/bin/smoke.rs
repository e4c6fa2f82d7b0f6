//! Seeds a single-location world and walks one order plus one replenishment
//! cycle end to end, logging every transition. Useful as a smoke check and as
//! a compact tour of the service API.

use chrono::Utc;

use stockline_availability::ChangedEntities;
use stockline_catalog::{
    BillOfMaterials, LocationProduct, LocationProductId, MaterialRef, Requirement, Variant,
    VariantId,
};
use stockline_core::{AggregateId, LocationId, UserId, WarehouseId};
use stockline_fulfillment::RequestedLine;
use stockline_infra::{
    EngineError, InMemoryEngine, StocklineService, TracingAuditSink, TracingNotificationSink,
    WorldState,
};
use stockline_orders::{Order, OrderId, OrderLine, OrderLineId, OrderLineStatus, OrderStatus};
use stockline_stock::{Ingredient, IngredientId, Material, MaterialId, UnitOfMeasure};

fn main() -> Result<(), EngineError> {
    stockline_observability::init();

    let mut world = WorldState::new();
    let location = LocationId::new();
    let warehouse = WarehouseId::new();

    let ingredient = Ingredient {
        id: IngredientId::new(AggregateId::new()),
        name: "Espresso beans".to_string(),
        unit: UnitOfMeasure::Grams,
    };
    let material = Material {
        id: MaterialId::new(AggregateId::new()),
        ingredient_id: ingredient.id,
        name: "Espresso beans 1kg".to_string(),
        shelf_life_days: 90,
        safety_threshold: 1000.0,
    };
    let variant = Variant {
        id: VariantId::new(AggregateId::new()),
        name: "Doppio".to_string(),
        bom: BillOfMaterials::new(vec![Requirement {
            material: MaterialRef::Ingredient(ingredient.id),
            quantity: 18.0,
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
    world.set_ingredient_stock(location, ingredient_id, 20.0, 50.0);
    world.set_warehouse_stock(warehouse, material_id, 5000.0);
    world.put_ingredient(ingredient);
    world.put_material(material);
    world.put_variant(variant);
    world.put_location_product(product.clone());

    let service = StocklineService::new(
        InMemoryEngine::new(world),
        TracingAuditSink,
        TracingNotificationSink,
    );
    let actor = UserId::new();
    let now = Utc::now();

    service.composition_changed(location, &ChangedEntities::for_ingredients([ingredient_id]), now)?;

    // A pending order over the 20g on hand flips the wrapper out of stock.
    let order_id = OrderId::new(AggregateId::new());
    let line_id = OrderLineId::new(AggregateId::new());
    service.place_order(
        Order {
            id: order_id,
            location_id: location,
            status: OrderStatus::Pending,
            lines: vec![OrderLine {
                id: line_id,
                location_product_id: product.id,
                status: OrderLineStatus::Pending,
                addons: vec![],
            }],
            created_at: now,
        },
        now,
    )?;

    // Replenish from the warehouse, then finish the order.
    let request = service.create_stock_request(
        location,
        warehouse,
        &[RequestedLine {
            material_id,
            quantity: 2000.0,
        }],
        now,
    )?;
    service.submit_request(request.id, actor, now)?;
    service.begin_request_delivery(request.id, actor, now)?;
    service.complete_request(request.id, actor, now)?;

    service.prepare_order_line(order_id, line_id)?;
    service.complete_order_line(order_id, line_id, now)?;

    let remaining = service.engine().read(|w| w.ingredient_quantity(location, ingredient_id))?;
    tracing::info!(%location, remaining, "smoke run finished");

    Ok(())
}
