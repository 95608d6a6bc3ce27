//! Administrator workflows: accounts, subject assignment, and ticket
//! monitoring.

use std::collections::BTreeSet;

use pagination::{Page, PageRequest};
use tracing::{debug, info};

use crate::domain::cache::{ResultCache, keys};
use crate::domain::entity::Entity;
use crate::domain::dto::{AssignSubjectsRequest, CreateUserRequest, SubjectDto, TicketDto, UserDto};
use crate::domain::ports::map_store_error;
use crate::domain::service_support::{list_as, page_as};
use crate::domain::specs::{
    AdminTicketFilter, doctor_subjects_of, high_priority_tickets, messages_sent_by,
    subjects_in_program, tickets_involving, user_search,
};
use crate::domain::{
    DoctorSubject, Error, Message, Program, Role, Subject, Ticket, UnitOfWorkFactory, User,
};

/// Administration use cases.
#[derive(Clone)]
pub struct AdminService {
    sessions: UnitOfWorkFactory,
    cache: ResultCache,
}

impl AdminService {
    /// Create the service.
    pub fn new(sessions: UnitOfWorkFactory, cache: ResultCache) -> Self {
        Self { sessions, cache }
    }

    /// One page of users ordered by id.
    ///
    /// `search` matches id, user name or display name case-insensitively;
    /// `program` restricts to one program.
    pub async fn list_users(
        &self,
        search: Option<&str>,
        program: Option<Program>,
        page: PageRequest,
    ) -> Result<Page<UserDto>, Error> {
        let spec = user_search(search, program, Some(page))?;
        page_as(&mut self.sessions.begin(), &spec).await
    }

    /// Look up one account.
    pub async fn get_user(&self, id: &str) -> Result<Option<UserDto>, Error> {
        let user = self
            .sessions
            .begin()
            .repository::<User>()
            .get_by_id(&id.to_owned())
            .await
            .map_err(map_store_error)?;
        Ok(user.map(UserDto::from))
    }

    /// Register an account. The id doubles as the login name.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserDto, Error> {
        let id = request.id.trim();
        if id.is_empty() {
            return Err(Error::invalid_request("user id must not be empty"));
        }
        if request.name.trim().is_empty() {
            return Err(Error::invalid_request("user name must not be empty"));
        }

        let mut uow = self.sessions.begin();
        let users = uow.repository::<User>();
        let key = id.to_owned();
        if users.get_by_id(&key).await.map_err(map_store_error)?.is_some() {
            return Err(Error::invalid_request(format!("user `{key}` already exists")));
        }

        let user = User {
            user_name: key.clone(),
            id: key,
            name: request.name.trim().to_owned(),
            role: request.role,
            program: request.program,
        };
        users.add(user.clone());
        uow.save_changes().await.map_err(map_store_error)?;
        info!(user_id = %user.id, role = %user.role, "user created");
        self.invalidate_user_results(&user);
        Ok(user.into())
    }

    /// Remove an account and its subject assignments. Returns whether
    /// anything was deleted.
    ///
    /// Users still named on a ticket or a message are refused with
    /// [`ErrorCode::InvalidRequest`](crate::domain::ErrorCode::InvalidRequest).
    pub async fn delete_user(&self, id: &str) -> Result<bool, Error> {
        let mut uow = self.sessions.begin();
        let users = uow.repository::<User>();
        let Some(user) = users.get_by_id(&id.to_owned()).await.map_err(map_store_error)? else {
            return Ok(false);
        };

        let tickets = uow
            .repository::<Ticket>()
            .count(&tickets_involving(&user.id)?)
            .await
            .map_err(map_store_error)?;
        let messages = uow
            .repository::<Message>()
            .count(&messages_sent_by(&user.id)?)
            .await
            .map_err(map_store_error)?;
        if tickets > 0 || messages > 0 {
            return Err(Error::invalid_request(format!(
                "user `{}` is still referenced by {tickets} ticket(s) and {messages} message(s)",
                user.id
            )));
        }

        let assignments = uow.repository::<DoctorSubject>();
        let taught = assignments
            .get_all_matching(Some(&doctor_subjects_of(&user.id)?))
            .await
            .map_err(map_store_error)?;
        for assignment in &taught {
            assignments
                .delete(&assignment.key())
                .await
                .map_err(map_store_error)?;
        }
        users.delete(&user.id).await.map_err(map_store_error)?;

        let deleted = uow.save_changes().await.map_err(map_store_error)? > 0;
        if deleted {
            info!(user_id = id, assignments = taught.len(), "user deleted");
            self.invalidate_user_results(&user);
            if !taught.is_empty() {
                self.cache.remove_all(&keys::all_subjects_variants());
            }
        }
        Ok(deleted)
    }

    /// Replace the subjects a doctor teaches with `request.subject_ids`.
    ///
    /// Only the difference is written: assignments no longer wanted are
    /// removed and new ones added. Returns whether any assignment changed.
    /// Unknown doctors and subjects are rejected before anything is staged.
    pub async fn assign_subjects(&self, request: AssignSubjectsRequest) -> Result<bool, Error> {
        let mut uow = self.sessions.begin();
        let doctor = uow
            .repository::<User>()
            .get_by_id(&request.doctor_id)
            .await
            .map_err(map_store_error)?;
        if !doctor.is_some_and(|user| user.role == Role::Doctor) {
            return Err(Error::invalid_request(format!(
                "`{}` is not a doctor",
                request.doctor_id
            )));
        }

        let wanted: BTreeSet<String> = request.subject_ids.into_iter().collect();
        let subjects = uow.repository::<Subject>();
        for subject_id in &wanted {
            if subjects.get_by_id(subject_id).await.map_err(map_store_error)?.is_none() {
                return Err(Error::invalid_request(format!("unknown subject `{subject_id}`")));
            }
        }

        let assignments = uow.repository::<DoctorSubject>();
        let existing: BTreeSet<String> = assignments
            .get_all_matching(Some(&doctor_subjects_of(&request.doctor_id)?))
            .await
            .map_err(map_store_error)?
            .into_iter()
            .map(|assignment| assignment.subject_id)
            .collect();
        for subject_id in existing.difference(&wanted) {
            assignments
                .delete(&(request.doctor_id.clone(), subject_id.clone()))
                .await
                .map_err(map_store_error)?;
        }
        for subject_id in wanted.difference(&existing) {
            assignments.add(DoctorSubject::new(&request.doctor_id, subject_id));
        }

        let changed = uow.save_changes().await.map_err(map_store_error)? > 0;
        if changed {
            info!(doctor_id = %request.doctor_id, "doctor subjects reassigned");
            self.cache.remove(&keys::doctor_subjects(&request.doctor_id));
            self.cache.remove(&keys::doctor_subjects_detail(&request.doctor_id));
            self.cache.remove_all(&keys::all_subjects_variants());
        }
        Ok(changed)
    }

    /// Subjects taught by a doctor, ordered by id. Cached.
    pub async fn doctor_subjects(&self, doctor_id: &str) -> Result<Vec<SubjectDto>, Error> {
        let key = keys::doctor_subjects(doctor_id);
        if let Some(cached) = self.cache.try_get::<Vec<SubjectDto>>(&key) {
            return Ok(cached);
        }

        let assignments = self
            .sessions
            .begin()
            .repository::<DoctorSubject>()
            .get_all_matching(Some(&doctor_subjects_of(doctor_id)?))
            .await
            .map_err(map_store_error)?;
        let mut subjects: Vec<SubjectDto> = assignments
            .into_iter()
            .filter_map(|assignment| assignment.subject.map(SubjectDto::from))
            .collect();
        subjects.sort_by(|left, right| left.id.cmp(&right.id));

        self.cache
            .set(key, subjects.clone(), self.cache.ttls().doctor_subjects);
        Ok(subjects)
    }

    /// Subject catalogue, optionally within one program. Cached per program.
    pub async fn all_subjects(&self, program: Option<Program>) -> Result<Vec<SubjectDto>, Error> {
        let key = keys::all_subjects(program);
        if let Some(cached) = self.cache.try_get::<Vec<SubjectDto>>(&key) {
            return Ok(cached);
        }

        let subjects: Vec<SubjectDto> =
            list_as(&mut self.sessions.begin(), &subjects_in_program(program)?).await?;
        self.cache
            .set(key, subjects.clone(), self.cache.ttls().all_subjects);
        Ok(subjects)
    }

    /// One page of tickets selected by `filter`, newest first.
    pub async fn filtered_tickets(
        &self,
        filter: &AdminTicketFilter,
        page: PageRequest,
    ) -> Result<Page<TicketDto>, Error> {
        let spec = filter.specification(Some(page))?;
        page_as(&mut self.sessions.begin(), &spec).await
    }

    /// Every high-priority ticket, newest first.
    pub async fn high_priority_tickets(
        &self,
        program: Option<Program>,
    ) -> Result<Vec<TicketDto>, Error> {
        list_as(&mut self.sessions.begin(), &high_priority_tickets(program, None)?).await
    }

    /// One page of high-priority tickets.
    pub async fn high_priority_tickets_paged(
        &self,
        program: Option<Program>,
        page: PageRequest,
    ) -> Result<Page<TicketDto>, Error> {
        page_as(&mut self.sessions.begin(), &high_priority_tickets(program, Some(page))?).await
    }

    /// Set or clear the high-priority flag. Returns `false` when the ticket
    /// does not exist.
    ///
    /// No cached result depends on the flag, so nothing is invalidated.
    pub async fn mark_high_priority(&self, ticket_id: &str, flag: bool) -> Result<bool, Error> {
        let mut uow = self.sessions.begin();
        let tickets = uow.repository::<Ticket>();
        let Some(mut ticket) = tickets
            .get_by_id(&ticket_id.to_owned())
            .await
            .map_err(map_store_error)?
        else {
            return Ok(false);
        };

        ticket.is_high_priority = flag;
        tickets.update(ticket);
        let updated = uow.save_changes().await.map_err(map_store_error)? > 0;
        debug!(ticket_id, flag, updated, "ticket priority set");
        Ok(updated)
    }

    fn invalidate_user_results(&self, user: &User) {
        self.cache.remove(&keys::admin_analytics());
        if user.role == Role::Doctor {
            self.cache.remove(&keys::doctor_subjects(&user.id));
            self.cache.remove_all(&keys::doctor_ticket_keys(&user.id));
        }
    }
}

#[cfg(test)]
#[path = "admin_service_tests.rs"]
mod tests;
