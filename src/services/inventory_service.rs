use crate::entities::{drink_item_entity as items, inventory_entity as inventory};
use crate::error::{AppError, AppResult};
use crate::models::{InventoryLineResponse, RarityTier, SellResponse};
use crate::services::PlayerService;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};

/// 背包服务: (player, item, rarity) -> quantity 的增删查与出售
#[derive(Clone)]
pub struct InventoryService {
    pool: DatabaseConnection,
    player_service: PlayerService,
}

impl InventoryService {
    pub fn new(pool: DatabaseConnection, player_service: PlayerService) -> Self {
        Self {
            pool,
            player_service,
        }
    }

    /// 掉落/受赠入包: 已有同 (item, rarity) 行则数量 +1, 否则插入新行
    pub async fn grant_tx(
        &self,
        txn: &DatabaseTransaction,
        player_id: i64,
        item_id: i64,
        rarity: RarityTier,
    ) -> AppResult<()> {
        let existing = inventory::Entity::find()
            .filter(inventory::Column::PlayerId.eq(player_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::Rarity.eq(rarity))
            .one(txn)
            .await?;

        match existing {
            Some(line) => {
                inventory::Entity::update_many()
                    .col_expr(
                        inventory::Column::Quantity,
                        Expr::col(inventory::Column::Quantity).add(1),
                    )
                    .filter(inventory::Column::Id.eq(line.id))
                    .exec(txn)
                    .await?;
            }
            None => {
                inventory::ActiveModel {
                    player_id: Set(player_id),
                    item_id: Set(item_id),
                    rarity: Set(rarity),
                    quantity: Set(1),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
            }
        }
        Ok(())
    }

    /// 取走一件: 数量减到 0 时删除整行而不是保留零值行。
    /// 返回 false 表示玩家没有这一行 (或数量不足), 无任何变更
    pub async fn take_one_tx(
        &self,
        txn: &DatabaseTransaction,
        player_id: i64,
        item_id: i64,
        rarity: RarityTier,
    ) -> AppResult<bool> {
        let line = inventory::Entity::find()
            .filter(inventory::Column::PlayerId.eq(player_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::Rarity.eq(rarity))
            .one(txn)
            .await?;

        let line = match line {
            Some(l) if l.quantity >= 1 => l,
            _ => return Ok(false),
        };

        if line.quantity == 1 {
            inventory::Entity::delete_by_id(line.id).exec(txn).await?;
        } else {
            let remaining = line.quantity - 1;
            let mut am = line.into_active_model();
            am.quantity = Set(remaining);
            am.update(txn).await?;
        }
        Ok(true)
    }

    /// 是否持有至少一件指定 (item, rarity)
    pub async fn holds(
        &self,
        player_id: i64,
        item_id: i64,
        rarity: RarityTier,
    ) -> AppResult<bool> {
        let line = inventory::Entity::find()
            .filter(inventory::Column::PlayerId.eq(player_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::Rarity.eq(rarity))
            .one(&self.pool)
            .await?;
        Ok(line.map(|l| l.quantity >= 1).unwrap_or(false))
    }

    /// 背包列表, 高稀有度在前, 同稀有度按名称
    pub async fn list(&self, player_id: i64) -> AppResult<Vec<InventoryLineResponse>> {
        let lines = inventory::Entity::find()
            .filter(inventory::Column::PlayerId.eq(player_id))
            .all(&self.pool)
            .await?;

        let mut result = Vec::with_capacity(lines.len());
        for line in lines {
            let item = items::Entity::find_by_id(line.item_id)
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::InternalError("Inventory references missing item".to_string()))?;
            result.push(InventoryLineResponse {
                item: item.into(),
                rarity: line.rarity,
                quantity: line.quantity,
            });
        }
        result.sort_by(|a, b| {
            b.rarity
                .rank()
                .cmp(&a.rarity.rank())
                .then_with(|| a.item.name.cmp(&b.item.name))
        });
        Ok(result)
    }

    /// 出售: 扣减背包行并按稀有度定价入账
    pub async fn sell(
        &self,
        player_id: i64,
        item_id: i64,
        rarity: RarityTier,
        quantity: i64,
    ) -> AppResult<SellResponse> {
        if quantity < 1 {
            return Err(AppError::ValidationError(
                "Sell quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.pool.begin().await?;

        let line = inventory::Entity::find()
            .filter(inventory::Column::PlayerId.eq(player_id))
            .filter(inventory::Column::ItemId.eq(item_id))
            .filter(inventory::Column::Rarity.eq(rarity))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("You do not own this item".to_string()))?;

        if line.quantity < quantity {
            return Err(AppError::ValidationError(format!(
                "You only have {} of this item",
                line.quantity
            )));
        }

        if line.quantity == quantity {
            inventory::Entity::delete_by_id(line.id).exec(&txn).await?;
        } else {
            inventory::Entity::update_many()
                .col_expr(
                    inventory::Column::Quantity,
                    Expr::col(inventory::Column::Quantity).sub(quantity),
                )
                .filter(inventory::Column::Id.eq(line.id))
                .exec(&txn)
                .await?;
        }

        let coins_gained = rarity.sell_value() * quantity;
        self.player_service
            .credit_coins_tx(&txn, player_id, coins_gained)
            .await?;
        let balance = self.player_service.get_tx(&txn, player_id).await?.balance;

        txn.commit().await?;

        Ok(SellResponse {
            coins_gained,
            balance,
        })
    }
}
