use crate::config::GameConfig;
use crate::entities::drink_item_entity as items;
use crate::error::{AppError, AppResult};
use crate::models::{ItemResponse, SubmitItemRequest};
use crate::services::{LockRegistry, PlayerService};
use crate::utils::check_cooldown;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Order,
    QueryFilter, QueryOrder, Set,
};

/// 图鉴服务: 物品目录与社区投稿
///
/// 投稿直接入库但 is_drawable = false, 审核通过前不参与掉落。
/// 投稿冷却不吃特权倍率。
#[derive(Clone)]
pub struct ItemService {
    pool: DatabaseConnection,
    locks: LockRegistry,
    player_service: PlayerService,
    game: GameConfig,
}

impl ItemService {
    pub fn new(
        pool: DatabaseConnection,
        locks: LockRegistry,
        player_service: PlayerService,
        game: GameConfig,
    ) -> Self {
        Self {
            pool,
            locks,
            player_service,
            game,
        }
    }

    pub async fn list(&self) -> AppResult<Vec<ItemResponse>> {
        let list = items::Entity::find()
            .order_by(items::Column::Name, Order::Asc)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn find_item(&self, item_id: i64) -> AppResult<items::Model> {
        items::Entity::find_by_id(item_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))
    }

    /// 社区投稿
    pub async fn submit(
        &self,
        user_id: i64,
        request: &SubmitItemRequest,
    ) -> AppResult<ItemResponse> {
        let _guard = self
            .locks
            .try_acquire(&LockRegistry::submission_key(user_id))
            .ok_or(AppError::DuplicateRequest)?;

        let name = request.name.trim();
        if name.len() < 2 || name.len() > 64 {
            return Err(AppError::ValidationError(
                "Item name must be 2-64 characters".to_string(),
            ));
        }
        if request.description.len() > 500 {
            return Err(AppError::ValidationError(
                "Description must be at most 500 characters".to_string(),
            ));
        }

        let now = Utc::now();
        let player = self.player_service.get_or_create(user_id, None).await?;
        let gate = check_cooldown(
            player.last_submission_at,
            self.game.submission_cooldown_secs,
            1.0,
            now,
        );
        if !gate.is_allowed() {
            return Err(AppError::CooldownActive {
                seconds_remaining: gate.seconds_remaining(),
            });
        }

        let exists = items::Entity::find()
            .filter(items::Column::Name.eq(name))
            .one(&self.pool)
            .await?;
        if exists.is_some() {
            return Err(AppError::ValidationError(format!(
                "An item named '{name}' already exists"
            )));
        }

        let item = items::ActiveModel {
            name: Set(name.to_string()),
            description: Set(request.description.clone()),
            image_ref: Set(request.image_ref.clone()),
            is_special: Set(false),
            is_drawable: Set(false),
            created_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        self.player_service.set_last_submission_at(user_id, now).await?;
        log::info!("Player {user_id} submitted item '{name}' (id {})", item.id);
        Ok(item.into())
    }

    /// 审核通过: 投稿进入掉落池
    pub async fn admin_approve(&self, item_id: i64) -> AppResult<ItemResponse> {
        let item = self.find_item(item_id).await?;
        let mut am = item.into_active_model();
        am.is_drawable = Set(true);
        Ok(am.update(&self.pool).await?.into())
    }

    /// 管理员直接建条目, 立即可掉落
    pub async fn admin_create_item(
        &self,
        name: &str,
        description: Option<&str>,
        image_ref: Option<String>,
        is_special: bool,
    ) -> AppResult<ItemResponse> {
        let item = items::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.unwrap_or_default().to_string()),
            image_ref: Set(image_ref),
            is_special: Set(is_special),
            is_drawable: Set(true),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(item.into())
    }

    /// 删除条目; 背包行随外键级联清理
    pub async fn admin_delete(&self, item_id: i64) -> AppResult<()> {
        let result = items::Entity::delete_by_id(item_id).exec(&self.pool).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Item not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn setup() -> ItemService {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).min_connections(1);
        let pool = Database::connect(options).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();

        let players = PlayerService::new(pool.clone());
        ItemService::new(pool, LockRegistry::new(), players, GameConfig::default())
    }

    fn submission(name: &str) -> SubmitItemRequest {
        SubmitItemRequest {
            name: name.to_string(),
            description: "A fizzy mystery".to_string(),
            image_ref: None,
        }
    }

    #[tokio::test]
    async fn test_submission_starts_undrawable() {
        let service = setup().await;
        let item = service.submit(1, &submission("Thunder Viper")).await.unwrap();
        assert!(!item.is_drawable);
        assert!(!item.is_special);

        let approved = service.admin_approve(item.id).await.unwrap();
        assert!(approved.is_drawable);
    }

    #[tokio::test]
    async fn test_submission_cooldown_blocks_second_attempt() {
        let service = setup().await;
        service.submit(1, &submission("First Drink")).await.unwrap();

        let second = service.submit(1, &submission("Second Drink")).await;
        assert!(matches!(second, Err(AppError::CooldownActive { .. })));

        // 冷却是按人计的, 别的玩家不受影响
        service.submit(2, &submission("Second Drink")).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let service = setup().await;
        service
            .admin_create_item("Spiced Wine", None, None, false)
            .await
            .unwrap();

        let result = service.submit(1, &submission("Spiced Wine")).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_admin_delete_missing_item() {
        let service = setup().await;
        let result = service.admin_delete(12345).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
