//! Ticket repository (工单数据访问)

use super::scope::{Owned, OwnerScope};
use crate::{
    error::AppError,
    models::{
        pagination::{PageRequest, SortDirection, SortField},
        patch::Changes,
        ticket::{CreateTicketRequest, Ticket, TicketFilter, TicketSortField},
    },
};
use sqlx::{PgPool, Postgres, QueryBuilder};

pub struct TicketRepository {
    db: PgPool,
}

impl TicketRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建工单
    pub async fn create(&self, req: &CreateTicketRequest, owner_id: i64) -> Result<Ticket, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (title, description, status, priority, project_id, assigned_to_id, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.status)
        .bind(&req.priority)
        .bind(req.project_id)
        .bind(req.assigned_to_id)
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;

        Ok(ticket)
    }

    /// 获取当前用户的工单
    pub async fn find(&self, scope: &OwnerScope, id: i64) -> Result<Option<Ticket>, AppError> {
        let mut query = scope.select(Owned::Tickets);
        query.push(" AND id = ").push_bind(id);

        let ticket = query
            .build_query_as::<Ticket>()
            .fetch_optional(&self.db)
            .await?;

        Ok(ticket)
    }

    /// 分页列出当前用户的工单
    pub async fn list(
        &self,
        scope: &OwnerScope,
        filter: &TicketFilter,
        page: PageRequest,
        sort: (TicketSortField, SortDirection),
    ) -> Result<Vec<Ticket>, AppError> {
        let (field, direction) = sort;

        let mut query = scope.select(Owned::Tickets);
        push_filter(&mut query, filter);
        query.push(field.order_by(direction));
        query.push(" LIMIT ").push_bind(page.limit);
        query.push(" OFFSET ").push_bind(page.offset());

        let tickets = query
            .build_query_as::<Ticket>()
            .fetch_all(&self.db)
            .await?;

        Ok(tickets)
    }

    /// 与 `list` 相同的过滤条件下的总数
    pub async fn count(&self, scope: &OwnerScope, filter: &TicketFilter) -> Result<i64, AppError> {
        let mut query = scope.count(Owned::Tickets);
        push_filter(&mut query, filter);

        let total = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    /// 项目下属于当前用户的全部工单
    pub async fn list_by_project(
        &self,
        scope: &OwnerScope,
        project_id: i64,
    ) -> Result<Vec<Ticket>, AppError> {
        let mut query = scope.select(Owned::Tickets);
        query.push(" AND project_id = ").push_bind(project_id);
        query.push(" ORDER BY id ASC");

        let tickets = query
            .build_query_as::<Ticket>()
            .fetch_all(&self.db)
            .await?;

        Ok(tickets)
    }

    pub async fn update(
        &self,
        scope: &OwnerScope,
        id: i64,
        changes: Changes,
    ) -> Result<Option<Ticket>, AppError> {
        let mut query = scope.update(Owned::Tickets, changes);
        query.push(" AND id = ").push_bind(id);
        query.push(" RETURNING *");

        let ticket = query
            .build_query_as::<Ticket>()
            .fetch_optional(&self.db)
            .await?;

        Ok(ticket)
    }

    /// 删除工单，返回被删除的记录
    pub async fn delete(&self, scope: &OwnerScope, id: i64) -> Result<Option<Ticket>, AppError> {
        let mut query = scope.delete(Owned::Tickets);
        query.push(" AND id = ").push_bind(id);
        query.push(" RETURNING *");

        let ticket = query
            .build_query_as::<Ticket>()
            .fetch_optional(&self.db)
            .await?;

        Ok(ticket)
    }
}

fn push_filter(query: &mut QueryBuilder<'static, Postgres>, filter: &TicketFilter) {
    if let Some(project_id) = filter.project_id {
        query.push(" AND project_id = ").push_bind(project_id);
    }

    if let Some(pattern) = filter.search_pattern() {
        query
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
