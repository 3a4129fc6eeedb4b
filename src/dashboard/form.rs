use clap::Args;

use crate::error::FormError;
use crate::ml::SimpleInput;

/// House inputs collected by the dashboard, with the form's starting values.
#[derive(Debug, Clone, PartialEq, Args)]
pub struct DashboardForm {
    /// Lot area in square feet
    #[arg(long, default_value_t = 8500)]
    pub lot_area: u32,

    #[arg(long, default_value_t = 3)]
    pub bedrooms: u32,

    #[arg(long, default_value_t = 2)]
    pub bathrooms: u32,

    #[arg(long, default_value_t = 2000)]
    pub year_built: u32,

    /// Overall quality, 1-10
    #[arg(long, default_value_t = 7)]
    pub overall_qual: u32,

    /// Above-grade living area in square feet
    #[arg(long, default_value_t = 1800)]
    pub gr_liv_area: u32,
}

impl Default for DashboardForm {
    fn default() -> Self {
        Self {
            lot_area: 8500,
            bedrooms: 3,
            bathrooms: 2,
            year_built: 2000,
            overall_qual: 7,
            gr_liv_area: 1800,
        }
    }
}

impl DashboardForm {
    /// Field names and values in display order.
    pub fn fields(&self) -> [(&'static str, u32); 6] {
        [
            ("lot_area", self.lot_area),
            ("bedrooms", self.bedrooms),
            ("bathrooms", self.bathrooms),
            ("year_built", self.year_built),
            ("overall_qual", self.overall_qual),
            ("gr_liv_area", self.gr_liv_area),
        ]
    }

    pub fn validate(&self) -> Result<(), FormError> {
        for ((field, value), (min, max)) in self.fields().into_iter().zip(FIELD_BOUNDS) {
            if value < min || value > max {
                return Err(FormError::OutOfRange { field, min, max, value });
            }
        }
        Ok(())
    }

    pub fn to_simple_input(&self) -> SimpleInput {
        SimpleInput {
            lot_area: Some(f64::from(self.lot_area)),
            bedrooms: Some(f64::from(self.bedrooms)),
            bathrooms: Some(f64::from(self.bathrooms)),
            year_built: Some(f64::from(self.year_built)),
            overall_qual: Some(f64::from(self.overall_qual)),
            gr_liv_area: Some(f64::from(self.gr_liv_area)),
        }
    }
}

/// Inclusive bounds, in the order of [`DashboardForm::fields`].
const FIELD_BOUNDS: [(u32, u32); 6] = [
    (1000, 50_000),
    (1, 10),
    (1, 10),
    (1900, 2025),
    (1, 10),
    (500, 5000),
];
