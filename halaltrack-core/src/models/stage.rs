use serde::{Deserialize, Serialize};

/// A step in the certification pipeline.
///
/// Variants are declared in pipeline order, so the derived `Ord` matches the
/// order tasks move through. The chain is linear and `Certified` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Prospek,
    Draft,
    Submitted,
    Pricing,
    PreAudit,
    Audit,
    Review,
    FatwaSession,
    Certified,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Prospek,
        Stage::Draft,
        Stage::Submitted,
        Stage::Pricing,
        Stage::PreAudit,
        Stage::Audit,
        Stage::Review,
        Stage::FatwaSession,
        Stage::Certified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prospek => "prospek",
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Pricing => "pricing",
            Self::PreAudit => "pre_audit",
            Self::Audit => "audit",
            Self::Review => "review",
            Self::FatwaSession => "fatwa_session",
            Self::Certified => "certified",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "prospek" => Some(Self::Prospek),
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "pricing" => Some(Self::Pricing),
            "pre_audit" => Some(Self::PreAudit),
            "audit" => Some(Self::Audit),
            "review" => Some(Self::Review),
            "fatwa_session" => Some(Self::FatwaSession),
            "certified" => Some(Self::Certified),
            _ => None,
        }
    }

    /// Display label used on the board and in AI prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Prospek => "Prospek",
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Pricing => "Penetapan Harga",
            Self::PreAudit => "Pra audit",
            Self::Audit => "Audit",
            Self::Review => "Review",
            Self::FatwaSession => "Sidang Komisi Fatwa",
            Self::Certified => "Sertifikat Terbit",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn is_final(&self) -> bool {
        self.next().is_none()
    }

    /// Default SLA in days. Zero means no SLA applies.
    pub fn default_sla_days(&self) -> u32 {
        match self {
            Self::Prospek | Self::Draft => 0,
            Self::Submitted => 1,
            Self::Pricing => 2,
            Self::PreAudit => 3,
            Self::Audit => 7,
            Self::Review => 3,
            Self::FatwaSession => 2,
            Self::Certified => 1,
        }
    }

    /// Checklist labels seeded for this stage when a task is created.
    pub fn default_checklist(&self) -> &'static [&'static str] {
        match self {
            Self::Prospek => &["Kontak Pertama", "Kebutuhan Sertifikasi", "Penawaran Awal"],
            Self::Draft => &["Dokumen Dasar", "Profil Perusahaan", "Draft Aplikasi"],
            Self::Submitted => &[
                "Formulir Pendaftaran",
                "NIB / Izin Usaha",
                "Data Penyelia Halal",
            ],
            Self::Pricing => &["Invoice Terbit", "Konfirmasi Pembayaran"],
            Self::PreAudit => &["Review Dokumen Bahan", "Matriks Produk", "Manual SJPH"],
            Self::Audit => &[
                "Laporan Audit Lapangan",
                "Foto Fasilitas Prod",
                "Checklist Temuan",
            ],
            Self::Review => &["Verifikasi Hasil Audit", "Draft Ketetapan Halal"],
            Self::FatwaSession => &["Hasil Sidang Fatwa", "Berita Acara"],
            Self::Certified => &["E-Sertifikat", "Copy Sertifikat Fisik"],
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
