//! Initial database migration.
//!
//! Creates the enums, core tables, and the uniqueness guarantees the
//! consolidation and lifecycle cores rely on.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TENANCY
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: RECONCILIATION DOCUMENTS
        // ============================================================
        db.execute_unprepared(DOCUMENTS_SQL).await?;
        db.execute_unprepared(DOCUMENT_LINES_SQL).await?;

        // ============================================================
        // PART 4: SUB-ACCOUNT REGISTRY
        // ============================================================
        db.execute_unprepared(SUBACCOUNTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- User roles
CREATE TYPE user_role AS ENUM (
    'system_admin',
    'company_admin',
    'accounting',
    'planning',
    'counter_party'
);

-- Document lifecycle status (forward-only: draft -> sent -> approved/rejected)
CREATE TYPE document_status AS ENUM (
    'draft',
    'sent',
    'approved',
    'rejected'
);
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    slug VARCHAR(100) NOT NULL UNIQUE,
    tax_number VARCHAR(32),
    contact_email VARCHAR(255),
    contact_phone VARCHAR(32),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_companies_slug ON companies(slug);
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    username VARCHAR(100) NOT NULL,
    email VARCHAR(255),
    phone VARCHAR(32),
    taxpayer_id VARCHAR(32),
    password_hash VARCHAR(255) NOT NULL,
    role user_role NOT NULL DEFAULT 'counter_party',
    must_change_password BOOLEAN NOT NULL DEFAULT false,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Usernames are scoped per company; counter-party provisioning derives
    -- them deterministically from the taxpayer id.
    CONSTRAINT uq_users_company_username UNIQUE (company_id, username)
);

CREATE INDEX idx_users_company ON users(company_id);
CREATE UNIQUE INDEX uq_users_company_taxpayer ON users(company_id, taxpayer_id)
    WHERE taxpayer_id IS NOT NULL;
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE documents (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    document_number VARCHAR(64) NOT NULL UNIQUE,
    issuer_id UUID NOT NULL REFERENCES users(id),
    counter_party_id UUID NOT NULL REFERENCES users(id),
    counter_party_taxpayer_id VARCHAR(32) NOT NULL,
    period_start DATE NOT NULL,
    period_end DATE NOT NULL,
    total_debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total_credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    net_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    line_count INTEGER NOT NULL DEFAULT 0,
    status document_status NOT NULL DEFAULT 'draft',
    note TEXT NOT NULL DEFAULT '',
    rejection_reason TEXT,
    statement_requested BOOLEAN NOT NULL DEFAULT false,
    approval_token VARCHAR(64),
    token_consumed BOOLEAN NOT NULL DEFAULT false,
    token_consumed_at TIMESTAMPTZ,
    token_expires_at TIMESTAMPTZ,
    sent_at TIMESTAMPTZ,
    approved_at TIMESTAMPTZ,
    rejected_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_net_balance CHECK (net_balance = total_debit - total_credit),
    CONSTRAINT chk_period CHECK (period_start <= period_end)
);

CREATE INDEX idx_documents_company ON documents(company_id);
CREATE INDEX idx_documents_counter_party ON documents(counter_party_id);
CREATE INDEX idx_documents_status ON documents(company_id, status);

-- Exactly one document per consolidation group: closes the race where two
-- concurrent batches would otherwise both create a document for the same
-- (taxpayer, period, note) key.
CREATE UNIQUE INDEX uq_documents_group ON documents(
    company_id, counter_party_taxpayer_id, period_start, period_end, note
);

-- The bearer token is looked up by exact match on the unauthenticated
-- approval channel.
CREATE UNIQUE INDEX uq_documents_approval_token ON documents(approval_token)
    WHERE approval_token IS NOT NULL;
";

const DOCUMENT_LINES_SQL: &str = r"
CREATE TABLE document_lines (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    document_id UUID NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    subaccount_code VARCHAR(64) NOT NULL,
    subaccount_name VARCHAR(255),
    balance NUMERIC(19, 4) NOT NULL,
    position INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_document_lines_document ON document_lines(document_id);
";

const SUBACCOUNTS_SQL: &str = r"
CREATE TABLE subaccounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    counter_party_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    code VARCHAR(64) NOT NULL,
    display_name VARCHAR(255) NOT NULL,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    last_reconciled_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_subaccounts_owner_code UNIQUE (counter_party_id, code)
);

CREATE INDEX idx_subaccounts_company ON subaccounts(company_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS subaccounts CASCADE;
DROP TABLE IF EXISTS document_lines CASCADE;
DROP TABLE IF EXISTS documents CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
DROP TYPE IF EXISTS document_status;
DROP TYPE IF EXISTS user_role;
";
