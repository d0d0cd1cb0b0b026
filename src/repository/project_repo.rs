//! Project repository (项目数据访问)

use super::scope::{Owned, OwnerScope};
use crate::{
    error::AppError,
    models::{
        pagination::{PageRequest, SortDirection, SortField},
        patch::Changes,
        project::{CreateProjectRequest, Project, ProjectSortField},
    },
};
use sqlx::PgPool;

pub struct ProjectRepository {
    db: PgPool,
}

impl ProjectRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建项目
    pub async fn create(
        &self,
        req: &CreateProjectRequest,
        owner_id: i64,
    ) -> Result<Project, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, description, owner_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .bind(owner_id)
        .fetch_one(&self.db)
        .await?;

        Ok(project)
    }

    /// 获取当前用户的项目
    pub async fn find(&self, scope: &OwnerScope, id: i64) -> Result<Option<Project>, AppError> {
        let mut query = scope.select(Owned::Projects);
        query.push(" AND id = ").push_bind(id);

        let project = query
            .build_query_as::<Project>()
            .fetch_optional(&self.db)
            .await?;

        Ok(project)
    }

    /// 分页列出当前用户的项目
    pub async fn list(
        &self,
        scope: &OwnerScope,
        page: PageRequest,
        sort: (ProjectSortField, SortDirection),
    ) -> Result<Vec<Project>, AppError> {
        let (field, direction) = sort;

        let mut query = scope.select(Owned::Projects);
        query.push(field.order_by(direction));
        query.push(" LIMIT ").push_bind(page.limit);
        query.push(" OFFSET ").push_bind(page.offset());

        let projects = query
            .build_query_as::<Project>()
            .fetch_all(&self.db)
            .await?;

        Ok(projects)
    }

    pub async fn count(&self, scope: &OwnerScope) -> Result<i64, AppError> {
        let total = scope
            .count(Owned::Projects)
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        Ok(total)
    }

    /// 更新项目，返回 `None` 表示项目不存在或不属于当前用户
    pub async fn update(
        &self,
        scope: &OwnerScope,
        id: i64,
        changes: Changes,
    ) -> Result<Option<Project>, AppError> {
        let mut query = scope.update(Owned::Projects, changes);
        query.push(" AND id = ").push_bind(id);
        query.push(" RETURNING *");

        let project = query
            .build_query_as::<Project>()
            .fetch_optional(&self.db)
            .await?;

        Ok(project)
    }

    /// 项目下的工单数量，不区分工单的所有者
    pub async fn count_tickets(&self, scope: &OwnerScope, id: i64) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM tickets t
            JOIN projects p ON p.id = t.project_id
            WHERE p.owner_id = $1 AND p.id = $2
            "#,
        )
        .bind(scope.owner_id())
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        Ok(total)
    }

    /// 删除没有工单的项目，返回被删除的记录
    pub async fn delete_if_empty(
        &self,
        scope: &OwnerScope,
        id: i64,
    ) -> Result<Option<Project>, AppError> {
        let mut query = scope.delete(Owned::Projects);
        query.push(" AND id = ").push_bind(id);
        query.push(
            " AND NOT EXISTS (SELECT 1 FROM tickets WHERE tickets.project_id = projects.id)",
        );
        query.push(" RETURNING *");

        let project = query
            .build_query_as::<Project>()
            .fetch_optional(&self.db)
            .await?;

        Ok(project)
    }
}
