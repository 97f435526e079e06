use sea_orm_migration::prelude::*;

/// Players (玩家账本: 余额 / 冷却时间戳 / 特权到期 / 自动搜索状态)
/// 注意: id 即 Telegram user id, 不自增
#[derive(DeriveIden)]
enum Players {
    Table,
    Id,
    Username,
    Balance,
    LastSearchAt,
    LastBonusAt,
    LastSubmissionAt,
    VipUntil,
    VipPlusUntil,
    PremiumUntil,
    AutoSearchEnabled,
    AutoSearchUsed,
    AutoSearchResetAt,
    QuotaBoost,
    QuotaBoostUntil,
    Locale,
    RemindersEnabled,
    CreatedAt,
    UpdatedAt,
}

/// Drink Items (能量饮料图鉴)
/// - is_special: 特殊物品, 抽中时稀有度强制为 special
/// - is_drawable: 是否参与随机掉落 (false = 社区投稿待审核 / 已下架)
#[derive(DeriveIden)]
enum DrinkItems {
    Table,
    Id,
    Name,
    Description,
    ImageRef,
    IsSpecial,
    IsDrawable,
    CreatedAt,
}

/// Inventory Entries ((玩家, 物品, 稀有度) -> 数量, 复合唯一)
#[derive(DeriveIden)]
enum InventoryEntries {
    Table,
    Id,
    PlayerId,
    ItemId,
    Rarity,
    Quantity,
}

/// Stock Counters (限量商品库存, kind -> 剩余数量)
#[derive(DeriveIden)]
enum StockCounters {
    Table,
    Kind,
    Stock,
}

/// Purchase Receipts (购买凭证, 只追加; 仅允许 status 流转为 verified)
#[derive(DeriveIden)]
enum PurchaseReceipts {
    Table,
    Id,
    PlayerId,
    Kind,
    CoinsSpent,
    DurationSecs,
    PurchasedAt,
    ValidUntil,
    Status,
    VerifiedBy,
    VerifiedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 玩家表
        manager
            .create_table(
                Table::create()
                    .table(Players::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Players::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Players::Username)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Players::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Players::LastSearchAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Players::LastBonusAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Players::LastSubmissionAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Players::VipUntil).timestamp_with_time_zone())
                    .col(ColumnDef::new(Players::VipPlusUntil).timestamp_with_time_zone())
                    .col(ColumnDef::new(Players::PremiumUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Players::AutoSearchEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Players::AutoSearchUsed)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Players::AutoSearchResetAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Players::QuotaBoost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Players::QuotaBoostUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Players::Locale)
                            .string()
                            .not_null()
                            .default("en"),
                    )
                    .col(
                        ColumnDef::new(Players::RemindersEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Players::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Players::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 图鉴表
        manager
            .create_table(
                Table::create()
                    .table(DrinkItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DrinkItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DrinkItems::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DrinkItems::Description)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(DrinkItems::ImageRef).string())
                    .col(
                        ColumnDef::new(DrinkItems::IsSpecial)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DrinkItems::IsDrawable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DrinkItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 背包表 (复合唯一 + 外键级联删除)
        manager
            .create_table(
                Table::create()
                    .table(InventoryEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryEntries::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryEntries::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryEntries::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryEntries::Rarity).string().not_null())
                    .col(
                        ColumnDef::new(InventoryEntries::Quantity)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_player")
                            .from(InventoryEntries::Table, InventoryEntries::PlayerId)
                            .to(Players::Table, Players::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_item")
                            .from(InventoryEntries::Table, InventoryEntries::ItemId)
                            .to(DrinkItems::Table, DrinkItems::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_player_item_rarity")
                    .table(InventoryEntries::Table)
                    .col(InventoryEntries::PlayerId)
                    .col(InventoryEntries::ItemId)
                    .col(InventoryEntries::Rarity)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 库存表
        manager
            .create_table(
                Table::create()
                    .table(StockCounters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockCounters::Kind)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockCounters::Stock)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // 购买凭证表
        manager
            .create_table(
                Table::create()
                    .table(PurchaseReceipts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseReceipts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseReceipts::PlayerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseReceipts::Kind).string().not_null())
                    .col(
                        ColumnDef::new(PurchaseReceipts::CoinsSpent)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseReceipts::DurationSecs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseReceipts::PurchasedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseReceipts::ValidUntil)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseReceipts::Status)
                            .string()
                            .not_null()
                            .default("completed"),
                    )
                    .col(ColumnDef::new(PurchaseReceipts::VerifiedBy).big_integer())
                    .col(ColumnDef::new(PurchaseReceipts::VerifiedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_receipts_player")
                    .table(PurchaseReceipts::Table)
                    .col(PurchaseReceipts::PlayerId)
                    .to_owned(),
            )
            .await?;

        // 初始库存: TG Premium 限量 5 份, 售罄后由管理员补货
        let seed = Query::insert()
            .into_table(StockCounters::Table)
            .columns([StockCounters::Kind, StockCounters::Stock])
            .values_panic(["premium".into(), 5.into()])
            .to_owned();
        manager.exec_stmt(seed).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseReceipts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockCounters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InventoryEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DrinkItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Players::Table).to_owned())
            .await?;
        Ok(())
    }
}
