use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::customer::{
        self, ActiveModel as CustomerActiveModel, Entity as CustomerEntity, Model as CustomerModel,
    },
    errors::ServiceError,
};

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 120, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 5, max = 20, message = "Phone must be between 5 and 20 characters"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 5, max = 20))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// Business-scoped customer records; phone number is the uniqueness key
/// within a business.
#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(business_id = %business_id))]
    pub async fn create_customer(
        &self,
        business_id: Uuid,
        input: CreateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        input.validate()?;

        let existing = CustomerEntity::find()
            .filter(customer::Column::BusinessId.eq(business_id))
            .filter(customer::Column::Phone.eq(input.phone.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A customer with phone '{}' already exists",
                input.phone
            )));
        }

        let now = Utc::now();
        let customer = CustomerActiveModel {
            id: Set(Uuid::new_v4()),
            business_id: Set(business_id),
            name: Set(input.name),
            phone: Set(input.phone),
            email: Set(input.email),
            address: Set(input.address),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db)
        .await?;

        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get_customer(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
    ) -> Result<CustomerModel, ServiceError> {
        self.find_owned(business_id, customer_id).await
    }

    /// Paginated list with an optional name/phone search.
    pub async fn list_customers(
        &self,
        business_id: Uuid,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<(Vec<CustomerModel>, u64), ServiceError> {
        let mut query = CustomerEntity::find().filter(customer::Column::BusinessId.eq(business_id));
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", term.trim());
            query = query.filter(
                Condition::any()
                    .add(customer::Column::Name.like(pattern.clone()))
                    .add(customer::Column::Phone.like(pattern)),
            );
        }

        let paginator = query
            .order_by_asc(customer::Column::Name)
            .paginate(&*self.db, per_page);
        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((customers, total))
    }

    pub async fn update_customer(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<CustomerModel, ServiceError> {
        input.validate()?;
        let existing = self.find_owned(business_id, customer_id).await?;

        if let Some(phone) = &input.phone {
            if *phone != existing.phone {
                let clash = CustomerEntity::find()
                    .filter(customer::Column::BusinessId.eq(business_id))
                    .filter(customer::Column::Phone.eq(phone.clone()))
                    .one(&*self.db)
                    .await?;
                if clash.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "A customer with phone '{}' already exists",
                        phone
                    )));
                }
            }
        }

        let mut active: CustomerActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(email) = input.email {
            active.email = Set(Some(email));
        }
        if let Some(address) = input.address {
            active.address = Set(Some(address));
        }
        if let Some(notes) = input.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    async fn find_owned(
        &self,
        business_id: Uuid,
        customer_id: Uuid,
    ) -> Result<CustomerModel, ServiceError> {
        CustomerEntity::find_by_id(customer_id)
            .filter(customer::Column::BusinessId.eq(business_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Customer not found".to_string()))
    }
}
