use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockledger API",
        version = "0.3.0",
        description = r#"
# Stockledger Inventory API

Batch-based stock accounting for small-business warehouses.

- **Batches**: lots of a product in a warehouse, the source of truth for on-hand quantity
- **Movements**: immutable IN/OUT/ADJUSTMENT/RETURN transactions allocated across batches
- **Stock**: derived per-(product, warehouse) totals with qualitative status
- **Reorder policies**: FIFO/LIFO/FEFO retrieval and reorder thresholds per pair
- **Alerts**: low-stock, out-of-stock and expiry conditions with an OPEN → ACKNOWLEDGED → RESOLVED lifecycle

## Authentication

All endpoints require a bearer token carrying `inventory:read` or
`inventory:full` permissions:

```
Authorization: Bearer <your-jwt-token>
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::handlers::batches::list_batches,
        crate::handlers::batches::get_batch,
        crate::handlers::batches::create_batch,
        crate::handlers::batches::delete_batch,
        crate::handlers::stock::list_stock,
        crate::handlers::stock::get_stock_level,
        crate::handlers::movements::list_movements,
        crate::handlers::movements::get_movement,
        crate::handlers::movements::create_movement,
        crate::handlers::movements::create_movement_with_policy,
        crate::handlers::movements::delete_movement,
        crate::handlers::alerts::list_alerts,
        crate::handlers::alerts::get_alert,
        crate::handlers::alerts::acknowledge_alert,
        crate::handlers::alerts::resolve_alert,
        crate::handlers::reorder_policies::list_policies,
        crate::handlers::reorder_policies::get_policy,
        crate::handlers::reorder_policies::upsert_policy,
        crate::handlers::reorder_policies::deactivate_policy,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::batches::BatchDto,
        crate::handlers::batches::CreateBatchRequest,
        crate::handlers::stock::StockDto,
        crate::handlers::movements::AllocationDto,
        crate::handlers::movements::MovementDto,
        crate::handlers::movements::MovementSummaryDto,
        crate::handlers::movements::AllocationRequest,
        crate::handlers::movements::CreateMovementRequest,
        crate::handlers::movements::CreatePolicyMovementRequest,
        crate::handlers::alerts::AlertDto,
        crate::handlers::reorder_policies::ReorderPolicyDto,
        crate::handlers::reorder_policies::UpsertReorderPolicyRequest,
    )),
    tags(
        (name = "batches", description = "Batch ledger"),
        (name = "stock", description = "Derived stock aggregates"),
        (name = "movements", description = "Stock movements and allocations"),
        (name = "alerts", description = "Inventory alerts"),
        (name = "reorder-policies", description = "Reorder policies")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
