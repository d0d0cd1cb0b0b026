//! 项目服务

use crate::{
    error::AppError,
    models::{
        pagination::Page,
        patch::Patch,
        project::{
            CreateProjectRequest, Project, ProjectListQuery, ProjectWithTickets,
            UpdateProjectRequest,
        },
    },
    repository::{OwnerScope, ProjectRepository, TicketRepository},
};
use sqlx::PgPool;

pub struct ProjectService {
    db: PgPool,
}

impl ProjectService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        scope: &OwnerScope,
        req: &CreateProjectRequest,
    ) -> Result<Project, AppError> {
        let project = ProjectRepository::new(self.db.clone())
            .create(req, scope.owner_id())
            .await
            .map_err(name_taken)?;

        tracing::info!(project_id = project.id, owner_id = project.owner_id, "Project created");

        Ok(project)
    }

    pub async fn list(
        &self,
        scope: &OwnerScope,
        query: &ProjectListQuery,
    ) -> Result<Page<Project>, AppError> {
        let repo = ProjectRepository::new(self.db.clone());

        let items = repo.list(scope, query.page_request(), query.sort()).await?;
        let total = repo.count(scope).await?;

        Ok(Page { items, total })
    }

    /// 获取项目及其工单
    pub async fn get(&self, scope: &OwnerScope, id: i64) -> Result<ProjectWithTickets, AppError> {
        let project = self.find(scope, id).await?;
        let tickets = TicketRepository::new(self.db.clone())
            .list_by_project(scope, id)
            .await?;

        Ok(ProjectWithTickets { project, tickets })
    }

    pub async fn update(
        &self,
        scope: &OwnerScope,
        id: i64,
        req: &UpdateProjectRequest,
    ) -> Result<Project, AppError> {
        let changes = req.changes();
        if changes.is_empty() {
            return self.find(scope, id).await;
        }

        ProjectRepository::new(self.db.clone())
            .update(scope, id, changes)
            .await
            .map_err(name_taken)?
            .ok_or_else(project_not_found)
    }

    /// 删除项目；项目下仍有工单时拒绝删除
    pub async fn delete(&self, scope: &OwnerScope, id: i64) -> Result<Project, AppError> {
        let repo = ProjectRepository::new(self.db.clone());

        repo.find(scope, id).await?.ok_or_else(project_not_found)?;

        if repo.count_tickets(scope, id).await? > 0 {
            return Err(has_tickets());
        }

        // 并发创建的工单会让条件删除落空
        let project = repo.delete_if_empty(scope, id).await?.ok_or_else(has_tickets)?;

        tracing::info!(project_id = project.id, "Project deleted");

        Ok(project)
    }

    async fn find(&self, scope: &OwnerScope, id: i64) -> Result<Project, AppError> {
        ProjectRepository::new(self.db.clone())
            .find(scope, id)
            .await?
            .ok_or_else(project_not_found)
    }
}

fn project_not_found() -> AppError {
    AppError::not_found("Project not found")
}

fn has_tickets() -> AppError {
    AppError::conflict(
        "PROJECT_HAS_TICKETS",
        "Cannot delete a project that still has tickets",
    )
}

fn name_taken(e: AppError) -> AppError {
    e.on_unique_violation("PROJECT_NAME_TAKEN", "Project name already exists")
}
