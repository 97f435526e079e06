use crate::error::{AppError, AppResult};
use crate::models::{CreateGiftRequest, GiftOfferResponse, RarityTier};
use crate::services::{InventoryService, ItemService, LockRegistry, PlayerService};
use crate::utils::generate_offer_token;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// 赠礼要约的存活时长
const OFFER_TTL_SECS: i64 = 3600;

/// 挂起中的赠礼要约
///
/// 要约只存在内存里, 物品在接受那一刻才真正转移。
/// 进程重启丢失未接受的要约是可接受的: 物品仍在赠送方包里。
#[derive(Debug, Clone)]
struct GiftOffer {
    giver_id: i64,
    giver_username: String,
    recipient_id: i64,
    item_id: i64,
    item_name: String,
    rarity: RarityTier,
    expires_at: DateTime<Utc>,
}

/// 赠礼服务
#[derive(Clone)]
pub struct GiftService {
    pool: DatabaseConnection,
    locks: LockRegistry,
    player_service: PlayerService,
    inventory_service: InventoryService,
    item_service: ItemService,
    offers: Arc<Mutex<HashMap<Uuid, GiftOffer>>>,
}

impl GiftService {
    pub fn new(
        pool: DatabaseConnection,
        locks: LockRegistry,
        player_service: PlayerService,
        inventory_service: InventoryService,
        item_service: ItemService,
    ) -> Self {
        Self {
            pool,
            locks,
            player_service,
            inventory_service,
            item_service,
            offers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 创建要约: 校验持有后挂起, 不立即扣除物品
    pub async fn create_offer(
        &self,
        giver_id: i64,
        request: &CreateGiftRequest,
    ) -> AppResult<GiftOfferResponse> {
        let giver = self.player_service.get(giver_id).await?;

        let recipient = match (request.recipient_id, request.recipient_username.as_deref()) {
            (Some(id), _) => self.player_service.get(id).await?,
            (None, Some(name)) => self
                .player_service
                .find_by_username(name)
                .await?
                .ok_or_else(|| AppError::NotFound("Recipient not found".to_string()))?,
            (None, None) => {
                return Err(AppError::ValidationError(
                    "Either recipient_id or recipient_username is required".to_string(),
                ))
            }
        };
        if recipient.id == giver_id {
            return Err(AppError::ValidationError(
                "Cannot gift an item to yourself".to_string(),
            ));
        }

        let item = self.item_service.find_item(request.item_id).await?;
        if !self
            .inventory_service
            .holds(giver_id, request.item_id, request.rarity)
            .await?
        {
            return Err(AppError::NotFound(
                "You do not hold this item at this rarity".to_string(),
            ));
        }

        let token = generate_offer_token();
        let offer = GiftOffer {
            giver_id,
            giver_username: giver.username.clone(),
            recipient_id: recipient.id,
            item_id: item.id,
            item_name: item.name.clone(),
            rarity: request.rarity,
            expires_at: Utc::now() + Duration::seconds(OFFER_TTL_SECS),
        };

        let response = Self::to_response(token, &offer);
        self.offers.lock().await.insert(token, offer);
        log::info!(
            "Player {giver_id} offered {} ({}) to player {}",
            item.name,
            request.rarity,
            recipient.id
        );
        Ok(response)
    }

    /// 接受要约: 受赠人校验 + 要约锁下做转移事务
    pub async fn accept(&self, token: Uuid, user_id: i64) -> AppResult<GiftOfferResponse> {
        let _guard = self
            .locks
            .try_acquire(&LockRegistry::gift_key(&token))
            .ok_or(AppError::DuplicateRequest)?;

        let offer = self.take_offer_for(token, user_id).await?;

        let txn = self.pool.begin().await?;
        let moved = self
            .inventory_service
            .take_one_tx(&txn, offer.giver_id, offer.item_id, offer.rarity)
            .await?;
        if !moved {
            // 要约挂起期间赠送方把物品卖了/送了别人
            return Err(AppError::NotFound(
                "The giver no longer holds this item".to_string(),
            ));
        }
        self.inventory_service
            .grant_tx(&txn, user_id, offer.item_id, offer.rarity)
            .await?;
        txn.commit().await?;

        log::info!(
            "Player {user_id} accepted {} ({}) from player {}",
            offer.item_name,
            offer.rarity,
            offer.giver_id
        );
        Ok(Self::to_response(token, &offer))
    }

    /// 拒绝要约: 丢弃即可, 物品从未离开赠送方
    pub async fn decline(&self, token: Uuid, user_id: i64) -> AppResult<()> {
        self.take_offer_for(token, user_id).await?;
        Ok(())
    }

    /// 受赠人视角的待处理要约
    pub async fn incoming(&self, user_id: i64) -> AppResult<Vec<GiftOfferResponse>> {
        let now = Utc::now();
        let offers = self.offers.lock().await;
        let mut list: Vec<GiftOfferResponse> = offers
            .iter()
            .filter(|(_, o)| o.recipient_id == user_id && o.expires_at > now)
            .map(|(token, o)| Self::to_response(*token, o))
            .collect();
        list.sort_by_key(|o| o.expires_at);
        Ok(list)
    }

    /// 清理过期要约, 返回清掉的数量 (后台任务周期调用)
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut offers = self.offers.lock().await;
        let before = offers.len();
        offers.retain(|_, o| o.expires_at > now);
        before - offers.len()
    }

    /// 摘下要约并校验归属与时效; 非受赠人一律 OfferMismatch, 不泄露要约是否存在
    async fn take_offer_for(&self, token: Uuid, user_id: i64) -> AppResult<GiftOffer> {
        let mut offers = self.offers.lock().await;
        let offer = offers.get(&token).cloned().ok_or(AppError::OfferMismatch)?;
        if offer.recipient_id != user_id {
            return Err(AppError::OfferMismatch);
        }
        if offer.expires_at <= Utc::now() {
            offers.remove(&token);
            return Err(AppError::NotFound("This offer has expired".to_string()));
        }
        offers.remove(&token);
        Ok(offer)
    }

    fn to_response(token: Uuid, offer: &GiftOffer) -> GiftOfferResponse {
        GiftOfferResponse {
            token,
            giver_id: offer.giver_id,
            giver_username: offer.giver_username.clone(),
            item_id: offer.item_id,
            item_name: offer.item_name.clone(),
            rarity: offer.rarity,
            expires_at: offer.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn setup() -> (PlayerService, InventoryService, GiftService) {
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).min_connections(1);
        let pool = Database::connect(options).await.unwrap();
        Migrator::up(&pool, None).await.unwrap();

        let players = PlayerService::new(pool.clone());
        let inventory = InventoryService::new(pool.clone(), players.clone());
        let items = ItemService::new(
            pool.clone(),
            LockRegistry::new(),
            players.clone(),
            crate::config::GameConfig::default(),
        );
        let gifts = GiftService::new(
            pool.clone(),
            LockRegistry::new(),
            players.clone(),
            inventory.clone(),
            items,
        );
        (players, inventory, gifts)
    }

    async fn seed_item(gifts: &GiftService) -> i64 {
        gifts
            .item_service
            .admin_create_item("Spiced Wine", Some("Warm and heavy"), None, false)
            .await
            .unwrap()
            .id
    }

    async fn seed_holding(
        players: &PlayerService,
        inventory: &InventoryService,
        player_id: i64,
        item_id: i64,
        rarity: RarityTier,
    ) {
        players.get_or_create(player_id, Some("tester")).await.unwrap();
        let txn = players.pool().begin().await.unwrap();
        inventory
            .grant_tx(&txn, player_id, item_id, rarity)
            .await
            .unwrap();
        txn.commit().await.unwrap();
    }

    fn request_for(recipient_id: i64, item_id: i64) -> CreateGiftRequest {
        CreateGiftRequest {
            recipient_id: Some(recipient_id),
            recipient_username: None,
            item_id,
            rarity: RarityTier::Rare,
        }
    }

    #[tokio::test]
    async fn test_accept_moves_item_between_players() {
        let (players, inventory, gifts) = setup().await;
        let item_id = seed_item(&gifts).await;
        seed_holding(&players, &inventory, 1, item_id, RarityTier::Rare).await;
        players.get_or_create(2, Some("friend")).await.unwrap();

        let offer = gifts.create_offer(1, &request_for(2, item_id)).await.unwrap();
        gifts.accept(offer.token, 2).await.unwrap();

        assert!(!inventory.holds(1, item_id, RarityTier::Rare).await.unwrap());
        assert!(inventory.holds(2, item_id, RarityTier::Rare).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_recipient_gets_mismatch() {
        let (players, inventory, gifts) = setup().await;
        let item_id = seed_item(&gifts).await;
        seed_holding(&players, &inventory, 1, item_id, RarityTier::Rare).await;
        players.get_or_create(2, Some("friend")).await.unwrap();
        players.get_or_create(3, Some("stranger")).await.unwrap();

        let offer = gifts.create_offer(1, &request_for(2, item_id)).await.unwrap();
        let result = gifts.accept(offer.token, 3).await;
        assert!(matches!(result, Err(AppError::OfferMismatch)));

        // 要约仍然有效, 真正的受赠人还能接受
        gifts.accept(offer.token, 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_token_is_single_use() {
        let (players, inventory, gifts) = setup().await;
        let item_id = seed_item(&gifts).await;
        seed_holding(&players, &inventory, 1, item_id, RarityTier::Rare).await;
        players.get_or_create(2, Some("friend")).await.unwrap();

        let offer = gifts.create_offer(1, &request_for(2, item_id)).await.unwrap();
        gifts.accept(offer.token, 2).await.unwrap();

        let again = gifts.accept(offer.token, 2).await;
        assert!(matches!(again, Err(AppError::OfferMismatch)));
    }

    #[tokio::test]
    async fn test_accept_fails_if_giver_sold_the_item() {
        let (players, inventory, gifts) = setup().await;
        let item_id = seed_item(&gifts).await;
        seed_holding(&players, &inventory, 1, item_id, RarityTier::Rare).await;
        players.get_or_create(2, Some("friend")).await.unwrap();

        let offer = gifts.create_offer(1, &request_for(2, item_id)).await.unwrap();
        inventory.sell(1, item_id, RarityTier::Rare, 1).await.unwrap();

        let result = gifts.accept(offer.token, 2).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(!inventory.holds(2, item_id, RarityTier::Rare).await.unwrap());
    }

    #[tokio::test]
    async fn test_cannot_gift_to_self() {
        let (players, inventory, gifts) = setup().await;
        let item_id = seed_item(&gifts).await;
        seed_holding(&players, &inventory, 1, item_id, RarityTier::Rare).await;

        let result = gifts.create_offer(1, &request_for(1, item_id)).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired_offers() {
        let (players, inventory, gifts) = setup().await;
        let item_id = seed_item(&gifts).await;
        seed_holding(&players, &inventory, 1, item_id, RarityTier::Rare).await;
        players.get_or_create(2, Some("friend")).await.unwrap();

        let offer = gifts.create_offer(1, &request_for(2, item_id)).await.unwrap();
        assert_eq!(gifts.purge_expired().await, 0);

        // 手动把要约拨到过期
        gifts
            .offers
            .lock()
            .await
            .get_mut(&offer.token)
            .unwrap()
            .expires_at = Utc::now() - Duration::seconds(1);
        assert_eq!(gifts.purge_expired().await, 1);
        assert!(gifts.incoming(2).await.unwrap().is_empty());
    }
}
