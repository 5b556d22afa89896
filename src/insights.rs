use serde::{Deserialize, Serialize};

/// Closed set of insight categories produced by the analysis engine.
/// Tags the engine emits outside this set are folded into `Others`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InsightCategory {
    PieChart,
    BarChart,
    Histogram,
    Kde,
    Correlation,
    Forecast,
    Others,
}

impl InsightCategory {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "pie_chart" => InsightCategory::PieChart,
            "bar_chart" => InsightCategory::BarChart,
            "histogram" => InsightCategory::Histogram,
            "kde" => InsightCategory::Kde,
            "correlation" => InsightCategory::Correlation,
            "forecast" => InsightCategory::Forecast,
            _ => InsightCategory::Others,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightCategory::PieChart => "pie_chart",
            InsightCategory::BarChart => "bar_chart",
            InsightCategory::Histogram => "histogram",
            InsightCategory::Kde => "kde",
            InsightCategory::Correlation => "correlation",
            InsightCategory::Forecast => "forecast",
            InsightCategory::Others => "others",
        }
    }

    /// Whether artifacts in this category carry a numeric filter parameter.
    pub fn carries_filter(&self) -> bool {
        matches!(
            self,
            InsightCategory::BarChart | InsightCategory::Histogram | InsightCategory::Forecast
        )
    }
}

/// A stored artifact reference. Categories without a filter parameter are
/// serialised as a bare URL string; filtered categories as
/// `{"url": ..., "filterNumber": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArtifactRef {
    Bare(String),
    Filtered {
        url: String,
        #[serde(rename = "filterNumber")]
        filter_number: i64,
    },
}

impl ArtifactRef {
    pub fn new(url: String, filter_number: Option<i64>) -> Self {
        match filter_number {
            Some(filter_number) => ArtifactRef::Filtered { url, filter_number },
            None => ArtifactRef::Bare(url),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ArtifactRef::Bare(url) => url,
            ArtifactRef::Filtered { url, .. } => url,
        }
    }

    pub fn filter_number(&self) -> Option<i64> {
        match self {
            ArtifactRef::Bare(_) => None,
            ArtifactRef::Filtered { filter_number, .. } => Some(*filter_number),
        }
    }
}

/// Per-category insight buckets for one dataset. Order within each bucket is
/// the order artifacts arrived from the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightMap {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pie_chart: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bar_chart: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub histogram: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kde: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub correlation: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forecast: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub others: Vec<ArtifactRef>,
}

impl InsightMap {
    pub fn push(&mut self, category: InsightCategory, artifact: ArtifactRef) {
        self.bucket_mut(category).push(artifact);
    }

    pub fn bucket(&self, category: InsightCategory) -> &[ArtifactRef] {
        match category {
            InsightCategory::PieChart => &self.pie_chart,
            InsightCategory::BarChart => &self.bar_chart,
            InsightCategory::Histogram => &self.histogram,
            InsightCategory::Kde => &self.kde,
            InsightCategory::Correlation => &self.correlation,
            InsightCategory::Forecast => &self.forecast,
            InsightCategory::Others => &self.others,
        }
    }

    fn bucket_mut(&mut self, category: InsightCategory) -> &mut Vec<ArtifactRef> {
        match category {
            InsightCategory::PieChart => &mut self.pie_chart,
            InsightCategory::BarChart => &mut self.bar_chart,
            InsightCategory::Histogram => &mut self.histogram,
            InsightCategory::Kde => &mut self.kde,
            InsightCategory::Correlation => &mut self.correlation,
            InsightCategory::Forecast => &mut self.forecast,
            InsightCategory::Others => &mut self.others,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.pie_chart.len()
            + self.bar_chart.len()
            + self.histogram.len()
            + self.kde.len()
            + self.correlation.len()
            + self.forecast.len()
            + self.others.len()
    }
}
