//! Incident ticket import.
//!
//! Incident reports arrive as CSV exports with Spanish column headers. The
//! import wipes and reloads the incident file wholesale, loose-matching
//! each free-text location against the registry snapshot to set the weak
//! intersection reference. An unmatched location leaves the reference
//! absent and lands in the run summary; it never drops the incident.

use csv::WriterBuilder;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::error::ImportError;
use crate::matcher::RegistrySnapshot;
use crate::models::Incident;
use crate::report::RunSummary;

/// One row of the source export, headers as the reporting tool emits them.
#[derive(Debug, Deserialize)]
pub struct IncidentRow {
    #[serde(rename = "Nro")]
    pub incident_number: String,
    #[serde(rename = "Ticket")]
    pub ticket_number: String,
    #[serde(rename = "Incidencia")]
    pub incident_type: String,
    #[serde(rename = "Tipo")]
    pub incident_detail_type: String,
    #[serde(rename = "Cruce")]
    pub location_name: String,
    #[serde(rename = "Distrito")]
    pub district: String,
    #[serde(rename = "Administrado por")]
    pub managed_by: String,
    #[serde(rename = "Asignado a")]
    pub assigned_to: String,
    #[serde(rename = "Detalle")]
    pub description: String,
    #[serde(rename = "Operador")]
    pub operator: String,
    #[serde(rename = "Estado")]
    pub status: String,
    #[serde(rename = "Fecha de registro")]
    pub registered_at: String,
    #[serde(rename = "Fecha ultimo Estado")]
    pub last_status_update: String,
}

/// Reads the source export. An unreadable file is fatal for the run.
pub fn load_incident_rows(path: &Path) -> Result<Vec<IncidentRow>, ImportError> {
    let file = File::open(path)?;
    let mut rdr = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Converts source rows into incidents, resolving each location against
/// the registry snapshot.
pub fn link_incidents(
    rows: Vec<IncidentRow>,
    snapshot: &RegistrySnapshot,
    summary: &mut RunSummary,
) -> Vec<Incident> {
    rows.into_iter()
        .map(|row| {
            let intersection_id = match snapshot.match_location_loose(&row.location_name) {
                Some(intersection) => Some(intersection.id),
                None => {
                    summary.record_unmatched(&row.location_name);
                    None
                }
            };
            Incident {
                incident_number: row.incident_number,
                ticket_number: row.ticket_number,
                incident_type: row.incident_type,
                incident_detail_type: row.incident_detail_type,
                location_name: row.location_name,
                district: row.district,
                managed_by: row.managed_by,
                assigned_to: row.assigned_to,
                description: row.description,
                operator: row.operator,
                status: row.status,
                registered_at: row.registered_at,
                last_status_update: row.last_status_update,
                intersection_id,
            }
        })
        .collect()
}

/// Replaces the incident file wholesale with the given set.
pub fn write_incidents(path: &Path, incidents: &[Incident]) -> Result<(), ImportError> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for incident in incidents {
        writer.serialize(incident)?;
    }
    writer.flush()?;
    info!(incidents = incidents.len(), path = %path.display(), "Incidents written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Intersection;

    fn row(location: &str) -> IncidentRow {
        IncidentRow {
            incident_number: "1".into(),
            ticket_number: "T-100".into(),
            incident_type: "Semaforo".into(),
            incident_detail_type: "Falla".into(),
            location_name: location.into(),
            district: "Lima".into(),
            managed_by: "Centro".into(),
            assigned_to: "Equipo A".into(),
            description: "".into(),
            operator: "Op1".into(),
            status: "Abierto".into(),
            registered_at: "2025-04-23".into(),
            last_status_update: "2025-04-23".into(),
        }
    }

    fn snapshot() -> RegistrySnapshot {
        RegistrySnapshot::from_intersections(vec![Intersection::new(
            7,
            "AV. BOLIVAR - AV. GRAL. CORDOVA",
            0.0,
            0.0,
        )])
    }

    #[test]
    fn test_matched_location_sets_weak_reference() {
        let mut summary = RunSummary::new();
        let incidents = link_incidents(
            vec![row("Av. Bolivar - Av. Cordova")],
            &snapshot(),
            &mut summary,
        );
        assert_eq!(incidents[0].intersection_id, Some(7));
        assert!(summary.unmatched_labels.is_empty());
    }

    #[test]
    fn test_unmatched_location_keeps_incident() {
        let mut summary = RunSummary::new();
        let incidents = link_incidents(
            vec![row("Av. Arequipa - Av. Javier Prado")],
            &snapshot(),
            &mut summary,
        );
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].intersection_id, None);
        assert_eq!(summary.unmatched_labels, vec!["Av. Arequipa - Av. Javier Prado"]);
    }

    #[test]
    fn test_spanish_headers_deserialize() {
        let csv_data = "\
Nro,Ticket,Incidencia,Tipo,Cruce,Distrito,Administrado por,Asignado a,Detalle,Operador,Estado,Fecha de registro,Fecha ultimo Estado
1,T-100,Semaforo,Falla,Av. Bolivar - Av. Cordova,Lima,Centro,Equipo A,,Op1,Abierto,2025-04-23,2025-04-23
";
        let mut rdr = csv::Reader::from_reader(csv_data.as_bytes());
        let rows: Vec<IncidentRow> = rdr.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].location_name, "Av. Bolivar - Av. Cordova");
        assert_eq!(rows[0].ticket_number, "T-100");
    }
}
