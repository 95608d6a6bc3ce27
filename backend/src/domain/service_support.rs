//! Query helpers shared by the services.

use pagination::Page;

use crate::domain::entity::Entity;
use crate::domain::ports::map_store_error;
use crate::domain::specification::Specification;
use crate::domain::{Error, UnitOfWork};

/// Evaluate `spec` and map every row to `T`.
pub(crate) async fn list_as<E, T>(
    uow: &mut UnitOfWork,
    spec: &Specification<E>,
) -> Result<Vec<T>, Error>
where
    E: Entity,
    T: From<E>,
{
    let rows = uow
        .repository::<E>()
        .get_all_matching(Some(spec))
        .await
        .map_err(map_store_error)?;
    Ok(rows.into_iter().map(T::from).collect())
}

/// Evaluate a paged `spec` and wrap the rows with the unpaged total.
pub(crate) async fn page_as<E, T>(
    uow: &mut UnitOfWork,
    spec: &Specification<E>,
) -> Result<Page<T>, Error>
where
    E: Entity,
    T: From<E>,
{
    let request = spec
        .page()
        .ok_or_else(|| Error::internal(format!("paged {} query built without a page", E::KIND)))?;
    let data = list_as(uow, spec).await?;
    let total = uow
        .repository::<E>()
        .count(spec)
        .await
        .map_err(map_store_error)?;
    Ok(Page::new(data, total, request))
}
