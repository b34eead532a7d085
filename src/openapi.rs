use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "WashTrack API",
        version = env!("CARGO_PKG_VERSION"),
        description = r#"
Multi-tenant laundry operations API: order lifecycle, workshop routing,
inventory, customers, and subscription billing.

All endpoints except the billing webhook require a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

List endpoints accept `page`, `limit`, and where noted `search` / `status`
query parameters.
        "#
    ),
    servers(
        (url = "http://localhost:8080/api/v1", description = "Local development")
    ),
    tags(
        (name = "orders", description = "Order lifecycle and payments"),
        (name = "workshop", description = "Third-party workshop routing"),
        (name = "inventory", description = "Consumable stock and restock logs"),
        (name = "customers", description = "Business-scoped customer records"),
        (name = "billing", description = "Subscription status and gateway webhooks")
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::get_order_by_number,
        crate::handlers::orders::get_order_items,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::record_payment,
        crate::handlers::orders::assign_driver,
        crate::handlers::orders::get_status_history,
        crate::handlers::workshop::send_items_to_workshop,
        crate::handlers::workshop::update_workshop_item,
        crate::handlers::workshop::list_items_at_workshop,
        crate::handlers::inventory::create_item,
        crate::handlers::inventory::list_items,
        crate::handlers::inventory::list_low_stock,
        crate::handlers::inventory::get_item,
        crate::handlers::inventory::update_item,
        crate::handlers::inventory::adjust_stock,
        crate::handlers::inventory::get_restock_log,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::billing::billing_status,
        crate::handlers::billing::list_invoices,
        crate::handlers::payment_webhooks::payment_webhook,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,
            crate::models::OrderStatus,
            crate::models::OrderItemStatus,
            crate::models::WorkshopAction,
            crate::models::PaymentStatus,
            crate::models::OrderChannel,
            crate::models::PlanType,
            crate::models::PlanStatus,
            crate::models::StockAdjustmentType,
            crate::services::orders::CreateOrderInput,
            crate::services::orders::CreateOrderItemInput,
            crate::services::orders::OrderResponse,
            crate::handlers::orders::UpdateStatusBody,
            crate::handlers::orders::RecordPaymentBody,
            crate::handlers::orders::AssignDriverBody,
            crate::services::workshop::SendToWorkshopInput,
            crate::services::workshop::WorkshopItemUpdateInput,
            crate::services::workshop::WorkshopBatchResponse,
            crate::services::workshop::SkippedItem,
            crate::services::inventory::CreateInventoryItemInput,
            crate::services::inventory::UpdateInventoryItemInput,
            crate::services::inventory::AdjustStockInput,
            crate::services::customers::CreateCustomerInput,
            crate::services::customers::UpdateCustomerInput,
            crate::services::subscription::AccessDecision,
            crate::services::subscription::DenialReason,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
