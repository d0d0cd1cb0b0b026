//! 工单服务

use crate::{
    error::AppError,
    models::{
        pagination::Page,
        patch::Patch,
        ticket::{CreateTicketRequest, Ticket, TicketListQuery, UpdateTicketRequest},
    },
    repository::{OwnerScope, ProjectRepository, TicketRepository, UserRepository},
};
use sqlx::PgPool;

pub struct TicketService {
    db: PgPool,
}

impl TicketService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        scope: &OwnerScope,
        req: &CreateTicketRequest,
    ) -> Result<Ticket, AppError> {
        self.ensure_project_owned(scope, req.project_id).await?;
        if let Some(assignee) = req.assigned_to_id {
            self.ensure_assignee_exists(assignee).await?;
        }

        let ticket = TicketRepository::new(self.db.clone())
            .create(req, scope.owner_id())
            .await?;

        tracing::info!(
            ticket_id = ticket.id,
            project_id = ticket.project_id,
            owner_id = ticket.owner_id,
            "Ticket created"
        );

        Ok(ticket)
    }

    pub async fn list(
        &self,
        scope: &OwnerScope,
        query: &TicketListQuery,
    ) -> Result<Page<Ticket>, AppError> {
        let sort = query.sort()?;
        let filter = query.filter();

        if let Some(project_id) = filter.project_id {
            self.ensure_project_owned(scope, project_id).await?;
        }

        let repo = TicketRepository::new(self.db.clone());
        let items = repo.list(scope, &filter, query.page_request(), sort).await?;
        let total = repo.count(scope, &filter).await?;

        Ok(Page { items, total })
    }

    pub async fn get(&self, scope: &OwnerScope, id: i64) -> Result<Ticket, AppError> {
        TicketRepository::new(self.db.clone())
            .find(scope, id)
            .await?
            .ok_or_else(ticket_not_found)
    }

    pub async fn update(
        &self,
        scope: &OwnerScope,
        id: i64,
        req: &UpdateTicketRequest,
    ) -> Result<Ticket, AppError> {
        let current = self.get(scope, id).await?;

        if let Some(project_id) = req.project_id {
            if project_id != current.project_id {
                self.ensure_project_owned(scope, project_id).await?;
            }
        }
        if let Some(Some(assignee)) = req.assigned_to_id {
            self.ensure_assignee_exists(assignee).await?;
        }

        let changes = req.changes();
        if changes.is_empty() {
            return Ok(current);
        }

        TicketRepository::new(self.db.clone())
            .update(scope, id, changes)
            .await?
            .ok_or_else(ticket_not_found)
    }

    pub async fn delete(&self, scope: &OwnerScope, id: i64) -> Result<Ticket, AppError> {
        let ticket = TicketRepository::new(self.db.clone())
            .delete(scope, id)
            .await?
            .ok_or_else(ticket_not_found)?;

        tracing::info!(ticket_id = ticket.id, "Ticket deleted");

        Ok(ticket)
    }

    async fn ensure_project_owned(&self, scope: &OwnerScope, project_id: i64) -> Result<(), AppError> {
        ProjectRepository::new(self.db.clone())
            .find(scope, project_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| {
                AppError::bad_request("Project does not exist or does not belong to the current user")
            })
    }

    async fn ensure_assignee_exists(&self, user_id: i64) -> Result<(), AppError> {
        if UserRepository::new(self.db.clone()).exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::bad_request("Assigned user does not exist"))
        }
    }
}

fn ticket_not_found() -> AppError {
    AppError::not_found("Ticket not found")
}
