//! Zone Server - 房产项目三级导航服务
//!
//! 运营人员在项目总览图、楼栋立面图、楼层平面图上绘制可点击的多边形区域，
//! 并绑定到楼栋、楼层或房源；访客逐级下钻浏览实时的销售状态。
//!
//! # 模块结构
//!
//! ```text
//! zone-server/src/
//! ├── core/          # 配置、状态、HTTP 服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── geometry/      # 多边形归一化、包围盒、轮廓路径
//! ├── db/            # SQLite 连接池与仓储
//! ├── images/        # 层级底图与对象存储
//! ├── navigation/    # 三级导航解析与缓存
//! ├── catalogue/     # 可售房源列表 (版本轮换缓存)
//! ├── detection/     # 外部区域识别进程
//! └── utils/         # 日志、校验、响应封装
//! ```

pub mod api;
pub mod catalogue;
pub mod core;
pub mod db;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod images;
pub mod navigation;
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export 公共类型
pub use crate::core::server::build_app;
pub use crate::core::{Config, Server, ServerState};
pub use error::{ServiceError, ServiceResult};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger};

pub fn print_banner() {
    println!(
        r#"
 _____
|__  /___  _ __   ___
  / // _ \| '_ \ / _ \
 / /| (_) | | | |  __/
/____\___/|_| |_|\___|
    "#
    );
}
