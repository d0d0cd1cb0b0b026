//! 数据模型模块
//! 用户、项目、工单，以及分页与部分更新的公共类型

pub mod auth;
pub mod pagination;
pub mod patch;
pub mod project;
pub mod ticket;
pub mod user;
