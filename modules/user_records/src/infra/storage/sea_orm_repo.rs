use anyhow::Context;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

use crate::contract::model::UserRecord;
use crate::domain::repo::UserRecordsRepository;
use crate::infra::storage::entity::{Column, Entity};
use crate::infra::storage::mapper::{contract_to_active, entity_to_contract};

/// SeaORM-backed implementation of the domain repository port.
#[derive(Clone)]
pub struct SeaOrmUserRecordsRepository {
    conn: DatabaseConnection,
}

impl SeaOrmUserRecordsRepository {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl UserRecordsRepository for SeaOrmUserRecordsRepository {
    async fn find(&self, user_id: &str) -> anyhow::Result<Option<UserRecord>> {
        let found = Entity::find_by_id(user_id.to_owned())
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(entity_to_contract))
    }

    async fn insert(&self, record: &UserRecord) -> anyhow::Result<()> {
        contract_to_active(record)?
            .insert(&self.conn)
            .await
            .context("insert failed")?;
        Ok(())
    }

    async fn update(&self, record: &UserRecord) -> anyhow::Result<()> {
        contract_to_active(record)?
            .update(&self.conn)
            .await
            .context("update failed")?;
        Ok(())
    }

    async fn delete(&self, user_id: &str) -> anyhow::Result<bool> {
        let res = Entity::delete_by_id(user_id.to_owned())
            .exec(&self.conn)
            .await
            .context("delete failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn screenshot_refs(&self) -> anyhow::Result<Vec<String>> {
        Entity::find()
            .select_only()
            .column(Column::ScreenshotRef)
            .filter(Column::ScreenshotRef.is_not_null())
            .into_tuple::<String>()
            .all(&self.conn)
            .await
            .context("screenshot_refs query failed")
    }
}
