use plotters::style::{FontDesc, FontFamily, FontStyle, RGBColor};

/// Line colour of the fill series.
pub const SERIES_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Gridline colour, drawn with [`ChartStyle::grid_opacity`].
pub const GRID_COLOR: RGBColor = RGBColor(96, 96, 96);

/// Text placed on a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLabels {
    /// Title prefix, rendered as "{title} - {station}"
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartLabels {
    pub fn bikes() -> ChartLabels {
        ChartLabels {
            title: "Vélos disponibles (%)".to_string(),
            x_label: "Date".to_string(),
            y_label: "Disponibilité vélos (%)".to_string(),
        }
    }

    pub fn cars() -> ChartLabels {
        ChartLabels {
            title: "Remplissage (%)".to_string(),
            x_label: "Date".to_string(),
            y_label: "Remplissage (%)".to_string(),
        }
    }

    pub fn title_for(&self, station: &str) -> String {
        format!("{} - {}", self.title, station)
    }
}

/// Figure geometry. Sizes are given in points and inches and scaled by `dpi`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    pub font_pt: f64,
    pub title_pt: f64,
    pub line_pt: f64,
    pub grid_pt: f64,
    pub grid_opacity: f64,
}

impl Default for ChartStyle {
    fn default() -> Self {
        ChartStyle {
            width_in: 6.4,
            height_in: 4.8,
            dpi: 200,
            font_pt: 10.0,
            title_pt: 12.0,
            line_pt: 1.5,
            grid_pt: 0.5,
            grid_opacity: 0.6,
        }
    }
}

impl ChartStyle {
    /// Points to pixels at this style's resolution.
    pub fn px(&self, points: f64) -> f64 {
        points * f64::from(self.dpi) / 72.0
    }

    /// Pixel size of the figure.
    pub fn pixel_size(&self) -> (u32, u32) {
        let dpi = f64::from(self.dpi);
        (
            (self.width_in * dpi).round() as u32,
            (self.height_in * dpi).round() as u32,
        )
    }

    /// Stroke width in whole pixels, at least one.
    pub fn stroke(&self, points: f64) -> u32 {
        (self.px(points).round() as u32).max(1)
    }

    pub fn font(&self) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.px(self.font_pt), FontStyle::Normal)
    }

    pub fn title_font(&self) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, self.px(self.title_pt), FontStyle::Normal)
    }
}
