use std::convert::TryFrom;

use soudan_domain::{Event, EventId, ExpertId};
use sqlx::{types::Uuid, FromRow, PgPool};
use tracing::{error, instrument};

use super::IEventRepo;

#[derive(Debug)]
pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    expert_uid: Uuid,
    slug: String,
    title: String,
    duration_minutes: i64,
    active: bool,
    price_minor: i64,
    currency: String,
    display_order: i32,
}

impl TryFrom<EventRaw> for Event {
    type Error = anyhow::Error;

    fn try_from(e: EventRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: e.event_uid.into(),
            expert_id: e.expert_uid.into(),
            slug: e.slug,
            title: e.title,
            duration_minutes: e.duration_minutes,
            active: e.active,
            price_minor: e.price_minor,
            currency: e.currency,
            display_order: e.display_order,
        })
    }
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    #[instrument(name = "event::insert", skip(self, event), fields(event_id = %event.id))]
    async fn insert(&self, event: &Event) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events(event_uid, expert_uid, slug, title, duration_minutes, active, price_minor, currency, display_order)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(event.id.as_ref())
        .bind(event.expert_id.as_ref())
        .bind(&event.slug)
        .bind(&event.title)
        .bind(event.duration_minutes)
        .bind(event.active)
        .bind(event.price_minor)
        .bind(&event.currency)
        .bind(event.display_order)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                event_id = %event.id,
                slug = %event.slug,
                error = ?e,
                "Failed to insert event"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "event::save", skip(self, event), fields(event_id = %event.id))]
    async fn save(&self, event: &Event) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE events
            SET slug = $2,
                title = $3,
                duration_minutes = $4,
                active = $5,
                price_minor = $6,
                currency = $7,
                display_order = $8
            WHERE event_uid = $1
            "#,
        )
        .bind(event.id.as_ref())
        .bind(&event.slug)
        .bind(&event.title)
        .bind(event.duration_minutes)
        .bind(event.active)
        .bind(event.price_minor)
        .bind(&event.currency)
        .bind(event.display_order)
        .execute(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                event_id = %event.id,
                error = ?e,
                "Failed to save event"
            );
        })?;
        Ok(())
    }

    #[instrument(name = "event::find", skip(self))]
    async fn find(&self, event_id: &EventId) -> anyhow::Result<Option<Event>> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT e.* FROM events AS e
            WHERE e.event_uid = $1
            "#,
        )
        .bind(event_id.as_ref())
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                event_id = %event_id,
                error = ?e,
                "Failed to find event"
            );
        })?
        .map(Event::try_from)
        .transpose()
    }

    #[instrument(name = "event::find_by_slug", skip(self))]
    async fn find_by_slug(
        &self,
        expert_id: &ExpertId,
        slug: &str,
    ) -> anyhow::Result<Option<Event>> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT e.* FROM events AS e
            WHERE e.expert_uid = $1 AND e.slug = $2
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                slug,
                error = ?e,
                "Failed to find event by slug"
            );
        })?
        .map(Event::try_from)
        .transpose()
    }

    #[instrument(name = "event::find_by_expert", skip(self))]
    async fn find_by_expert(
        &self,
        expert_id: &ExpertId,
        only_active: bool,
    ) -> anyhow::Result<Vec<Event>> {
        sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT e.* FROM events AS e
            WHERE e.expert_uid = $1 AND ($2 = false OR e.active)
            ORDER BY e.display_order, e.slug
            "#,
        )
        .bind(expert_id.as_ref())
        .bind(only_active)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| {
            error!(
                expert_id = %expert_id,
                error = ?e,
                "Failed to find events for expert"
            );
        })?
        .into_iter()
        .map(Event::try_from)
        .collect()
    }
}
