use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use edrink_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{IdentityMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建服务
    let locks = LockRegistry::new();
    let player_service = PlayerService::new(pool.clone());
    let inventory_service = InventoryService::new(pool.clone(), player_service.clone());
    let item_service = ItemService::new(
        pool.clone(),
        locks.clone(),
        player_service.clone(),
        config.game.clone(),
    );
    let reward_service = RewardService::new(
        pool.clone(),
        locks.clone(),
        player_service.clone(),
        inventory_service.clone(),
        config.game.clone(),
    );
    let purchase_service =
        PurchaseService::new(pool.clone(), locks.clone(), player_service.clone());
    let gift_service = GiftService::new(
        pool.clone(),
        locks.clone(),
        player_service.clone(),
        inventory_service.clone(),
        item_service.clone(),
    );
    let autosearch_service = AutoSearchService::new(
        player_service.clone(),
        reward_service.clone(),
        config.game.clone(),
    );

    // 启动后台任务 (自动搜索恢复 + 过期要约清扫)
    tasks::spawn_all(autosearch_service.clone(), gift_service.clone());

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let admin_ids = config.admin.user_ids.clone();
    let bind_addr = (config.server.host.clone(), config.server.port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(IdentityMiddleware::new(admin_ids.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(player_service.clone()))
            .app_data(web::Data::new(inventory_service.clone()))
            .app_data(web::Data::new(item_service.clone()))
            .app_data(web::Data::new(reward_service.clone()))
            .app_data(web::Data::new(purchase_service.clone()))
            .app_data(web::Data::new(gift_service.clone()))
            .app_data(web::Data::new(autosearch_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::search_config)
                    .configure(handlers::player_config)
                    .configure(handlers::inventory_config)
                    .configure(handlers::shop_config)
                    .configure(handlers::gift_config)
                    .configure(handlers::autosearch_config)
                    .configure(handlers::items_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
