//! Prescription input as submitted by a doctor.

use chrono::NaiveDate;
use serde::Deserialize;

use medrx_core::{DomainError, DomainResult, deserialize_or_sentinel};

use crate::{MedicationType, PrescriptionStatus, PrescriptionType};

/// A medication as named in a draft. Only `name` is used; the stored
/// prescription references the catalog row with exactly that name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRef {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "deserialize_or_sentinel")]
    pub medication_type: Option<MedicationType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraft {
    /// ISO date (`YYYY-MM-DD`).
    pub prescription_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_or_sentinel")]
    pub prescription_type: Option<PrescriptionType>,
    pub medicine: Option<Vec<MedicationRef>>,
    pub qr_codes: Option<Vec<String>>,
    pub pharmacy_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_or_sentinel")]
    pub prescription_status: Option<PrescriptionStatus>,
}

/// Draft fields after the local (non-referential) checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedDraft {
    pub prescription_date: NaiveDate,
    pub prescription_type: PrescriptionType,
    /// Requested names, deduplicated, in first-seen order.
    pub medication_names: Vec<String>,
    pub qr_codes: Vec<String>,
    pub pharmacy_code: String,
}

fn blank(field: &str) -> DomainError {
    DomainError::validation(format!("{field} cannot be blank"))
}

impl PrescriptionDraft {
    /// Local checks, fail-fast in a fixed order: presence of date, type,
    /// medicine, QR codes, pharmacy code and status; then type not NONE; then
    /// status ACTIVE.
    pub fn check(&self) -> DomainResult<CheckedDraft> {
        let raw_date = self.prescription_date.as_deref().map(str::trim);
        let raw_date = raw_date.filter(|d| !d.is_empty()).ok_or_else(|| blank("PrescriptionDate"))?;
        let prescription_type = self.prescription_type.ok_or_else(|| blank("PrescriptionType"))?;
        let medicine = self
            .medicine
            .as_ref()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| blank("Medicine"))?;
        let qr_codes = self
            .qr_codes
            .as_ref()
            .filter(|q| !q.is_empty())
            .ok_or_else(|| blank("QrCodes"))?;
        let pharmacy_code = self
            .pharmacy_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| blank("PharmacyCode"))?;
        let status = self.prescription_status.ok_or_else(|| blank("PrescriptionStatus"))?;

        if prescription_type == PrescriptionType::None {
            return Err(DomainError::validation(
                "Prescription type should be E_REZEPT or PRIVAT",
            ));
        }
        if status != PrescriptionStatus::Active {
            return Err(DomainError::validation(
                "Prescription must have Status ACTIVE during creation.",
            ));
        }

        let prescription_date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            DomainError::validation("PrescriptionDate must be a date in YYYY-MM-DD format")
        })?;

        let mut medication_names: Vec<String> = Vec::with_capacity(medicine.len());
        for name in medicine.iter().map(|m| m.name.clone().unwrap_or_default()) {
            if !medication_names.contains(&name) {
                medication_names.push(name);
            }
        }

        Ok(CheckedDraft {
            prescription_date,
            prescription_type,
            medication_names,
            qr_codes: qr_codes.clone(),
            pharmacy_code: pharmacy_code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full() -> serde_json::Value {
        json!({
            "prescriptionDate": "2025-03-01",
            "prescriptionType": "E_REZEPT",
            "medicine": [{"name": "Aspirin"}, {"name": "Voltaren"}, {"name": "Aspirin"}],
            "qrCodes": ["QR-1"],
            "pharmacyCode": "PHARMA0001",
            "prescriptionStatus": "ACTIVE",
        })
    }

    fn check(v: serde_json::Value) -> DomainResult<CheckedDraft> {
        serde_json::from_value::<PrescriptionDraft>(v).unwrap().check()
    }

    #[test]
    fn valid_draft_dedupes_names_in_order() {
        let d = check(full()).unwrap();
        assert_eq!(d.medication_names, vec!["Aspirin".to_string(), "Voltaren".to_string()]);
        assert_eq!(d.prescription_type, PrescriptionType::ERezept);
    }

    #[test]
    fn missing_fields_fail_in_order() {
        let cases = [
            ("prescriptionDate", "PrescriptionDate cannot be blank"),
            ("prescriptionType", "PrescriptionType cannot be blank"),
            ("medicine", "Medicine cannot be blank"),
            ("qrCodes", "QrCodes cannot be blank"),
            ("pharmacyCode", "PharmacyCode cannot be blank"),
            ("prescriptionStatus", "PrescriptionStatus cannot be blank"),
        ];
        for (field, message) in cases {
            let mut body = full();
            body.as_object_mut().unwrap().remove(field);
            assert_eq!(check(body), Err(DomainError::validation(message)), "field {field}");
        }
    }

    #[test]
    fn empty_lists_count_as_blank() {
        let mut body = full();
        body["medicine"] = json!([]);
        body["qrCodes"] = json!([]);
        assert_eq!(check(body), Err(DomainError::validation("Medicine cannot be blank")));
    }

    #[test]
    fn first_missing_field_wins() {
        assert_eq!(check(json!({})), Err(DomainError::validation("PrescriptionDate cannot be blank")));
    }

    #[test]
    fn sentinel_type_is_rejected_before_status() {
        let mut body = full();
        body["prescriptionType"] = json!("cash");
        body["prescriptionStatus"] = json!("FULFILLED");
        assert_eq!(
            check(body),
            Err(DomainError::validation("Prescription type should be E_REZEPT or PRIVAT"))
        );
    }

    #[test]
    fn non_active_status_is_rejected() {
        for status in ["FULFILLED", "canceled", "bogus"] {
            let mut body = full();
            body["prescriptionStatus"] = json!(status);
            assert_eq!(
                check(body),
                Err(DomainError::validation("Prescription must have Status ACTIVE during creation."))
            );
        }
    }
}
