//! SQLite course catalog: schema init, course rows, registration insert.
//!
//! Tables:
//! - `courses`       — one row per course; full record as a JSON `detail` column
//! - `registrations` — lead-form submissions, FK to `courses`

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::catalog::{
    CourseDetails, CourseStore, CourseSummary, Instructor, ModuleInfo, NewRegistration,
    RegistrationRecord, StoreError, Testimonial, course_matches,
};

/// SQLite-backed `CourseStore`.
///
/// Uses a single `Mutex<Connection>` — safe to share across async tasks via
/// `Arc<SqliteCatalog>` since all operations take the lock synchronously.
/// (rusqlite `Connection` is `Send` but not `Sync`.)
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCatalog").finish_non_exhaustive()
    }
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Db(format!("create_dir_all: {e}")))?;
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::Db(format!("open {}: {e}", path.display())))?;

        // WAL + NORMAL sync: durable and fast enough for single-row writes.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory catalog (tests, throwaway REPL runs).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Db(format!("open: {e}")))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS courses (
                id     TEXT PRIMARY KEY,
                label  TEXT NOT NULL,
                level  TEXT NOT NULL,
                detail TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS registrations (
                id         TEXT PRIMARY KEY,
                course_id  TEXT NOT NULL REFERENCES courses(id),
                first_name TEXT NOT NULL,
                last_name  TEXT NOT NULL,
                email      TEXT NOT NULL,
                phone      TEXT NOT NULL,
                whatsapp   INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_registrations_course
                ON registrations(course_id);",
        )?;
        Ok(())
    }

    /// Insert or replace one course.
    pub fn upsert_course(&self, course: &CourseDetails) -> Result<(), StoreError> {
        let detail = serde_json::to_string(course)
            .map_err(|e| StoreError::Db(format!("encode course: {e}")))?;
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Db(format!("lock: {e}")))?;
        conn.execute(
            "INSERT OR REPLACE INTO courses (id, label, level, detail)
             VALUES (?1, ?2, ?3, ?4)",
            params![course.id, course.label, course.level, detail],
        )?;
        Ok(())
    }

    pub fn course_count(&self) -> Result<usize, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Db(format!("lock: {e}")))?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    pub fn registration_count(&self) -> Result<usize, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Db(format!("lock: {e}")))?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM registrations", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn all_details(&self) -> Result<Vec<CourseDetails>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Db(format!("lock: {e}")))?;
        let mut stmt = conn.prepare("SELECT detail FROM courses ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut courses = Vec::new();
        for row in rows {
            let detail = row?;
            let course: CourseDetails = serde_json::from_str(&detail)
                .map_err(|e| StoreError::Db(format!("decode course: {e}")))?;
            courses.push(course);
        }
        Ok(courses)
    }
}

impl CourseStore for SqliteCatalog {
    fn course_by_id(&self, id: &str) -> Result<Option<CourseDetails>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Db(format!("lock: {e}")))?;
        let detail: Option<String> = conn
            .query_row(
                "SELECT detail FROM courses WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match detail {
            Some(d) => serde_json::from_str(&d)
                .map(Some)
                .map_err(|e| StoreError::Db(format!("decode course '{id}': {e}"))),
            None => Ok(None),
        }
    }

    fn list_courses(&self) -> Result<Vec<CourseSummary>, StoreError> {
        Ok(self.all_details()?.iter().map(CourseDetails::summary).collect())
    }

    // Containment is checked in Rust rather than SQL: SQLite `lower()` only
    // folds ASCII, which breaks on accented labels ("Sécurité").
    fn courses_matching(&self, needle: &str) -> Result<Vec<CourseDetails>, StoreError> {
        let needle_lower = needle.to_lowercase();
        Ok(self
            .all_details()?
            .into_iter()
            .filter(|c| course_matches(c, &needle_lower))
            .collect())
    }

    fn create_registration(&self, reg: &NewRegistration) -> Result<RegistrationRecord, StoreError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Db(format!("lock: {e}")))?;
        let tx = conn.transaction()?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM courses WHERE id = ?1",
                params![reg.course_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            // Transaction drops uncommitted: nothing written.
            return Err(StoreError::UnknownCourse(reg.course_id.clone()));
        }

        let record = RegistrationRecord {
            id: Uuid::new_v4().to_string(),
            course_id: reg.course_id.clone(),
            email: reg.email.clone(),
            created_at: Utc::now(),
        };
        tx.execute(
            "INSERT INTO registrations
                 (id, course_id, first_name, last_name, email, phone, whatsapp, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                reg.course_id,
                reg.first_name,
                reg.last_name,
                reg.email,
                reg.phone,
                reg.whatsapp as i64,
                record.created_at.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Demo catalog
// ---------------------------------------------------------------------------

/// Built-in French demo catalog. Seeded by the binary when the database is
/// empty; reused as a deterministic fixture set by the integration tests.
pub fn demo_courses() -> Vec<CourseDetails> {
    vec![
        CourseDetails {
            id: "python".into(),
            label: "Python pour l'Ingénierie de Données".into(),
            description: "Maîtrisez Python appliqué aux pipelines de données: \
                          collecte, transformation et automatisation."
                .into(),
            level: "Niveau débutant".into(),
            duration: "5 jours (35 heures)".into(),
            format: "Distanciel ou présentiel".into(),
            price: Some("1 490 € HT".into()),
            modules: vec![
                ModuleInfo {
                    title: "Fondamentaux Python".into(),
                    description: "Syntaxe, structures de données et environnement de travail."
                        .into(),
                    topics: vec![
                        "variables et types".into(),
                        "fonctions".into(),
                        "environnements virtuels".into(),
                        "tests unitaires".into(),
                    ],
                },
                ModuleInfo {
                    title: "Manipulation de données".into(),
                    description: "Pandas et SQL pour nettoyer et croiser des jeux de données."
                        .into(),
                    topics: vec!["pandas".into(), "SQL".into(), "formats de fichiers".into()],
                },
                ModuleInfo {
                    title: "Automatisation de pipelines".into(),
                    description: "Orchestrer des traitements reproductibles.".into(),
                    topics: vec!["planification".into(), "journalisation".into()],
                },
            ],
            instructors: vec![Instructor {
                name: "Claire Dubois".into(),
                title: "Data engineer, 10 ans d'expérience".into(),
            }],
            skills: vec!["Python".into(), "SQL".into(), "Pandas".into()],
            certifications: vec!["Certification interne Python Data".into()],
            testimonials: vec![Testimonial {
                author: "Karim".into(),
                role: Some("Analyste reconverti".into()),
                quote: "Une progression très concrète, j'ai automatisé mes rapports dès la \
                        deuxième semaine."
                    .into(),
            }],
            enrolled: 240,
            rating: 4.8,
        },
        CourseDetails {
            id: "aws".into(),
            label: "Architecture Cloud AWS".into(),
            description: "Concevez et déployez des architectures AWS fiables: réseau, calcul, \
                          stockage et infrastructure as code avec Terraform."
                .into(),
            level: "Niveau intermédiaire".into(),
            duration: "4 jours (28 heures)".into(),
            format: "Distanciel".into(),
            price: Some("1 890 € HT".into()),
            modules: vec![
                ModuleInfo {
                    title: "Socle AWS".into(),
                    description: "Comptes, IAM, réseau VPC et services de calcul.".into(),
                    topics: vec!["IAM".into(), "VPC".into(), "EC2".into()],
                },
                ModuleInfo {
                    title: "Infrastructure as Code".into(),
                    description: "Décrire l'infrastructure avec Terraform.".into(),
                    topics: vec!["Terraform".into(), "modules".into(), "état distant".into()],
                },
            ],
            instructors: vec![Instructor {
                name: "Louis Martin".into(),
                title: "Architecte cloud certifié AWS".into(),
            }],
            skills: vec!["AWS".into(), "Terraform".into(), "Réseau".into()],
            certifications: vec!["Préparation AWS Solutions Architect Associate".into()],
            testimonials: vec![Testimonial {
                author: "Sophie".into(),
                role: Some("Administratrice système".into()),
                quote: "Le fil rouge Terraform donne une vraie méthode de travail.".into(),
            }],
            enrolled: 180,
            rating: 4.7,
        },
        CourseDetails {
            id: "docker".into(),
            label: "Conteneurisation Docker et Kubernetes".into(),
            description: "Industrialisez vos déploiements: images Docker, orchestration \
                          Kubernetes et chaînes CI/CD."
                .into(),
            level: "Niveau avancé".into(),
            duration: "3 jours (21 heures)".into(),
            format: "Présentiel".into(),
            price: Some("1 690 € HT".into()),
            modules: vec![
                ModuleInfo {
                    title: "Docker en production".into(),
                    description: "Images reproductibles, registres et sécurité des conteneurs."
                        .into(),
                    topics: vec!["Dockerfile".into(), "registres".into(), "sécurité".into()],
                },
                ModuleInfo {
                    title: "Orchestration Kubernetes".into(),
                    description: "Déploiements, services et montée en charge.".into(),
                    topics: vec!["pods".into(), "services".into(), "autoscaling".into()],
                },
            ],
            instructors: vec![Instructor {
                name: "Nadia Benali".into(),
                title: "SRE, formatrice Kubernetes".into(),
            }],
            skills: vec!["Docker".into(), "Kubernetes".into(), "CI/CD".into()],
            certifications: vec!["Préparation CKA".into()],
            testimonials: vec![],
            enrolled: 95,
            rating: 4.6,
        },
    ]
}
