//! CRUD endpoints for the dashboard resources.
//!
//! ```text
//! GET    /api/v1/{resource}                 list (query: ListParams)
//! POST   /api/v1/{resource}                 create
//! GET    /api/v1/{resource}/{id}            fetch one
//! PATCH  /api/v1/{resource}/{id}            update
//! DELETE /api/v1/{resource}/{id}            archive (soft delete)
//! POST   /api/v1/{resource}/{id}/restore    restore
//! DELETE /api/v1/{resource}/{id}/permanent  purge
//! ```

use actix_web::{Scope, web};
use pagination::Paginated;
use uuid::Uuid;

use super::error::ActionResponse;
use super::session::SessionContext;
use super::state::{HttpState, RoutedResource};
use crate::domain::ports::Record;
use crate::domain::{DeletedRecord, ListParams, RecordRef, RecordUpdate};

/// Routes for resource `I::RESOURCE`, mounted at `/<table>`.
pub fn resource_scope<I: RoutedResource>() -> Scope {
    web::scope(&format!("/{}", I::RESOURCE.table()))
        .route("", web::get().to(list::<I>))
        .route("", web::post().to(create::<I>))
        .route("/{id}", web::get().to(get::<I>))
        .route("/{id}", web::patch().to(update::<I>))
        .route("/{id}", web::delete().to(archive::<I>))
        .route("/{id}/restore", web::post().to(restore::<I>))
        .route("/{id}/permanent", web::delete().to(purge::<I>))
}

async fn list<I: RoutedResource>(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<ListParams>,
) -> ActionResponse<Paginated<Record>> {
    I::actions(&state)
        .list
        .run(&session.scope(), params.into_inner())
        .await
        .into()
}

async fn create<I: RoutedResource>(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<I>,
) -> ActionResponse<Record> {
    I::actions(&state)
        .create
        .run(&session.scope(), payload.into_inner())
        .await
        .into()
}

async fn get<I: RoutedResource>(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<Uuid>,
) -> ActionResponse<Record> {
    let target = RecordRef { id: id.into_inner() };
    I::actions(&state).get.run(&session.scope(), target).await.into()
}

async fn update<I: RoutedResource>(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<Uuid>,
    payload: web::Json<I>,
) -> ActionResponse<Record> {
    let input = RecordUpdate {
        id: id.into_inner(),
        changes: payload.into_inner(),
    };
    I::actions(&state)
        .update
        .run(&session.scope(), input)
        .await
        .into()
}

async fn archive<I: RoutedResource>(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<Uuid>,
) -> ActionResponse<Record> {
    let target = RecordRef { id: id.into_inner() };
    I::actions(&state)
        .archive
        .run(&session.scope(), target)
        .await
        .into()
}

async fn restore<I: RoutedResource>(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<Uuid>,
) -> ActionResponse<Record> {
    let target = RecordRef { id: id.into_inner() };
    I::actions(&state)
        .restore
        .run(&session.scope(), target)
        .await
        .into()
}

async fn purge<I: RoutedResource>(
    state: web::Data<HttpState>,
    session: SessionContext,
    id: web::Path<Uuid>,
) -> ActionResponse<DeletedRecord> {
    let target = RecordRef { id: id.into_inner() };
    I::actions(&state)
        .purge
        .run(&session.scope(), target)
        .await
        .into()
}
