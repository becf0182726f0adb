use anyhow::Result;
use shared::{UserSummary, UserType};

use super::{new_id, Admin, Client, ClientUpdate, Database, NewClient, NewOrganization, NewVolunteer};
use super::{Organization, OrganizationUpdate, Volunteer, VolunteerUpdate};

/// Records an admin creates and keeps a reference list for
#[derive(Debug, Clone, Copy)]
pub enum AdminRecord {
    Organization,
    Client,
    Video,
}

impl AdminRecord {
    fn column(&self) -> &'static str {
        match self {
            AdminRecord::Organization => "org_ids",
            AdminRecord::Client => "client_ids",
            AdminRecord::Video => "videos_uploaded",
        }
    }
}

const ADMIN_COLUMNS: &str =
    "id, email, password_hash, ip_addresses, org_ids, client_ids, videos_uploaded, created_at";
const CLIENT_COLUMNS: &str = "id, email, first_name, last_name, phone, org_id, plan, \
    subscription_status, stripe_customer_id, stripe_subscription_id, trial_ends_at, created_at";
const ORGANIZATION_COLUMNS: &str = "id, email, name, contact_person, phone, address, created_at";
const VOLUNTEER_COLUMNS: &str = "id, email, first_name, last_name, phone, created_at";

impl Database {
    // Admin operations
    pub async fn create_admin(&self, email: &str, password_hash: &str) -> Result<Admin> {
        let id = new_id();
        sqlx::query("INSERT INTO admins (id, email, password_hash) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        self.get_admin_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("admin {} vanished after insert", id))
    }

    pub async fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {} FROM admins WHERE email = ?",
            ADMIN_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    pub async fn get_admin_by_id(&self, id: &str) -> Result<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {} FROM admins WHERE id = ?",
            ADMIN_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    /// Remember an address the admin logged in from; duplicates are skipped
    pub async fn record_admin_ip(&self, admin_id: &str, ip: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE admins SET ip_addresses = json_insert(ip_addresses, '$[#]', ?)
            WHERE id = ?
              AND NOT EXISTS (SELECT 1 FROM json_each(admins.ip_addresses) WHERE value = ?)
            "#,
        )
        .bind(ip)
        .bind(admin_id)
        .bind(ip)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append `id` to the admin's list of records they created
    pub async fn record_admin_creation(&self, admin_id: &str, kind: AdminRecord, id: &str) -> Result<()> {
        let column = kind.column();
        sqlx::query(&format!(
            "UPDATE admins SET {col} = json_insert({col}, '$[#]', ?) WHERE id = ?",
            col = column
        ))
        .bind(id)
        .bind(admin_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop a deleted record from every admin's reference list
    pub async fn forget_admin_record(&self, kind: AdminRecord, id: &str) -> Result<u64> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE admins
            SET {col} = (SELECT json_group_array(value) FROM json_each(admins.{col}) WHERE value != ?)
            WHERE EXISTS (SELECT 1 FROM json_each(admins.{col}) WHERE value = ?)
            "#,
            col = kind.column()
        ))
        .bind(id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    // Client operations
    pub async fn create_client(&self, client: &NewClient) -> Result<Client> {
        let id = new_id();
        sqlx::query(
            r#"
            INSERT INTO clients (id, email, first_name, last_name, phone, org_id, plan,
                subscription_status, stripe_customer_id, stripe_subscription_id, trial_ends_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&client.email)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.phone)
        .bind(&client.org_id)
        .bind(&client.plan)
        .bind(&client.subscription_status)
        .bind(&client.stripe_customer_id)
        .bind(&client.stripe_subscription_id)
        .bind(client.trial_ends_at)
        .execute(&self.pool)
        .await?;
        self.get_client_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("client {} vanished after insert", id))
    }

    pub async fn get_client_by_id(&self, id: &str) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE id = ?",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    pub async fn get_client_by_email(&self, email: &str) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE email = ?",
            CLIENT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients ORDER BY created_at ASC",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    pub async fn list_clients_for_org(&self, org_id: &str) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE org_id = ? ORDER BY created_at ASC",
            CLIENT_COLUMNS
        ))
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    pub async fn update_client(&self, id: &str, update: &ClientUpdate) -> Result<Option<Client>> {
        sqlx::query(
            r#"
            UPDATE clients SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                phone = COALESCE(?, phone),
                org_id = COALESCE(?, org_id),
                plan = COALESCE(?, plan),
                subscription_status = COALESCE(?, subscription_status)
            WHERE id = ?
            "#,
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(&update.org_id)
        .bind(&update.plan)
        .bind(&update.subscription_status)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_client_by_id(id).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Organization operations
    pub async fn create_organization(&self, org: &NewOrganization) -> Result<Organization> {
        let id = new_id();
        sqlx::query(
            "INSERT INTO organizations (id, email, name, contact_person, phone, address) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&org.email)
        .bind(&org.name)
        .bind(&org.contact_person)
        .bind(&org.phone)
        .bind(&org.address)
        .execute(&self.pool)
        .await?;
        self.get_organization_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("organization {} vanished after insert", id))
    }

    pub async fn get_organization_by_id(&self, id: &str) -> Result<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations WHERE id = ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    pub async fn get_organization_by_email(&self, email: &str) -> Result<Option<Organization>> {
        let org = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations WHERE email = ?",
            ORGANIZATION_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        let orgs = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {} FROM organizations ORDER BY created_at ASC",
            ORGANIZATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(orgs)
    }

    pub async fn update_organization(
        &self,
        id: &str,
        update: &OrganizationUpdate,
    ) -> Result<Option<Organization>> {
        sqlx::query(
            r#"
            UPDATE organizations SET
                name = COALESCE(?, name),
                contact_person = COALESCE(?, contact_person),
                phone = COALESCE(?, phone),
                address = COALESCE(?, address)
            WHERE id = ?
            "#,
        )
        .bind(&update.name)
        .bind(&update.contact_person)
        .bind(&update.phone)
        .bind(&update.address)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_organization_by_id(id).await
    }

    pub async fn delete_organization(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Volunteer operations
    pub async fn create_volunteer(&self, volunteer: &NewVolunteer) -> Result<Volunteer> {
        let id = new_id();
        sqlx::query(
            "INSERT INTO volunteers (id, email, first_name, last_name, phone) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&volunteer.email)
        .bind(&volunteer.first_name)
        .bind(&volunteer.last_name)
        .bind(&volunteer.phone)
        .execute(&self.pool)
        .await?;
        self.get_volunteer_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("volunteer {} vanished after insert", id))
    }

    pub async fn get_volunteer_by_id(&self, id: &str) -> Result<Option<Volunteer>> {
        let volunteer = sqlx::query_as::<_, Volunteer>(&format!(
            "SELECT {} FROM volunteers WHERE id = ?",
            VOLUNTEER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(volunteer)
    }

    pub async fn get_volunteer_by_email(&self, email: &str) -> Result<Option<Volunteer>> {
        let volunteer = sqlx::query_as::<_, Volunteer>(&format!(
            "SELECT {} FROM volunteers WHERE email = ?",
            VOLUNTEER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(volunteer)
    }

    pub async fn list_volunteers(&self) -> Result<Vec<Volunteer>> {
        let volunteers = sqlx::query_as::<_, Volunteer>(&format!(
            "SELECT {} FROM volunteers ORDER BY created_at ASC",
            VOLUNTEER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(volunteers)
    }

    pub async fn update_volunteer(
        &self,
        id: &str,
        update: &VolunteerUpdate,
    ) -> Result<Option<Volunteer>> {
        sqlx::query(
            r#"
            UPDATE volunteers SET
                first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                phone = COALESCE(?, phone)
            WHERE id = ?
            "#,
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone)
        .bind(id)
        .execute(&self.pool)
        .await?;
        self.get_volunteer_by_id(id).await
    }

    pub async fn delete_volunteer(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM volunteers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // Role-agnostic lookups used by the login flows
    pub async fn find_account(&self, user_type: UserType, email: &str) -> Result<Option<UserSummary>> {
        let summary = match user_type {
            UserType::Admin => self.get_admin_by_email(email).await?.map(|a| a.summary()),
            UserType::Client => self.get_client_by_email(email).await?.map(|c| c.summary()),
            UserType::Organization => self
                .get_organization_by_email(email)
                .await?
                .map(|o| o.summary()),
            UserType::Volunteer => self.get_volunteer_by_email(email).await?.map(|v| v.summary()),
        };
        Ok(summary)
    }

    pub async fn get_account(&self, user_type: UserType, id: &str) -> Result<Option<UserSummary>> {
        let summary = match user_type {
            UserType::Admin => self.get_admin_by_id(id).await?.map(|a| a.summary()),
            UserType::Client => self.get_client_by_id(id).await?.map(|c| c.summary()),
            UserType::Organization => self.get_organization_by_id(id).await?.map(|o| o.summary()),
            UserType::Volunteer => self.get_volunteer_by_id(id).await?.map(|v| v.summary()),
        };
        Ok(summary)
    }
}
