/// Application-wide constants to avoid magic values throughout the codebase.
///
/// This module centralizes the allow-lists, defaults and literal strings used
/// by the loader, analyzer, detector and generator.
/// Output format constants
pub mod output_formats {
    /// Text output format - Jsonnet on stdout, colored summary on stderr
    pub const TEXT: &str = "text";
    /// JSON output format - structured report for automation
    pub const JSON: &str = "json";
    /// Minimal output format - only the generated Jsonnet
    pub const MINIMAL: &str = "minimal";

    /// Default output format
    pub const DEFAULT: &str = TEXT;

    /// All valid output formats
    pub const ALL: [&str; 3] = [TEXT, JSON, MINIMAL];
}

/// Generator and detector defaults
pub mod defaults {
    /// Spaces per nesting level
    pub const INDENT_SIZE: usize = 4;
    /// Advisory wrap width for inline sequences
    pub const MAX_LINE_LENGTH: usize = 120;
    /// Inclusive threshold for a value to count as a pattern
    pub const MIN_PATTERN_OCCURRENCES: usize = 2;
    /// Minimum panels of one type before a template function is synthesized
    pub const MIN_TEMPLATE_PANELS: usize = 2;
    /// Config file looked up in the working directory and its parents
    pub const CONFIG_FILE_NAME: &str = ".grafana2jsonnet.toml";
    /// Parent directories searched for a config file
    pub const CONFIG_SEARCH_DEPTH: usize = 3;
}

/// Limits enforced when validating configuration
pub mod limits {
    pub const MIN_INDENT_SIZE: usize = 1;
    pub const MAX_INDENT_SIZE: usize = 16;
    pub const MIN_LINE_LENGTH: usize = 20;
    pub const MIN_PATTERN_OCCURRENCES: usize = 1;
}

/// Fallback values the analyzer applies to absent dashboard fields
pub mod dashboard {
    pub const UNTITLED: &str = "Untitled Dashboard";
    pub const DEFAULT_TIMEZONE: &str = "browser";
    pub const UNKNOWN_PANEL_TYPE: &str = "unknown";
    pub const UNKNOWN_DATASOURCE: &str = "unknown";

    /// Default grid position as (x, y, w, h)
    pub const DEFAULT_GRID: (i64, i64, i64, i64) = (0, 0, 12, 8);

    /// Keys that wrap a dashboard one level down
    pub const NESTING_KEYS: [&str; 3] = ["grafana", "spec", "resource"];

    /// Dashboard-level keys copied into `DashboardAnalysis::dashboard_config`
    pub const CONFIG_KEYS: [&str; 20] = [
        "id",
        "uid",
        "title",
        "tags",
        "timezone",
        "schemaVersion",
        "version",
        "refresh",
        "time",
        "timepicker",
        "templating",
        "annotations",
        "description",
        "style",
        "editable",
        "fiscalYearStartMonth",
        "graphTooltip",
        "liveNow",
        "weekStart",
        "panelIds",
    ];
}

/// Panel key allow-lists
pub mod panel_keys {
    /// Keys mapped onto dedicated `PanelRecord` fields
    pub const CORE: [&str; 9] = [
        "id",
        "type",
        "title",
        "gridPos",
        "targets",
        "datasource",
        "options",
        "fieldConfig",
        "transformations",
    ];

    /// Every panel key recognized as standard Grafana configuration
    pub const KNOWN: [&str; 39] = [
        "id",
        "type",
        "title",
        "gridPos",
        "targets",
        "datasource",
        "options",
        "fieldConfig",
        "transformations",
        "transparent",
        "description",
        "repeat",
        "repeatDirection",
        "maxPerRow",
        "collapsed",
        "panels",
        "legend",
        "tooltip",
        "bars",
        "lines",
        "fill",
        "fillGradient",
        "linewidth",
        "dashLength",
        "dashVector",
        "points",
        "pointradius",
        "percentage",
        "steppedLine",
        "nullPointMode",
        "aliasColors",
        "seriesOverrides",
        "thresholds",
        "overrides",
        "xaxis",
        "yaxes",
        "yaxis",
        "decimals",
        "links",
    ];
}

/// Jsonnet language constants
pub mod jsonnet {
    /// Reserved words that cannot be used as bare identifiers
    pub const KEYWORDS: [&str; 18] = [
        "assert",
        "else",
        "error",
        "false",
        "for",
        "function",
        "if",
        "import",
        "importstr",
        "importbin",
        "in",
        "local",
        "null",
        "tailstrict",
        "then",
        "self",
        "super",
        "true",
    ];

    /// Names a generated local must not shadow
    pub const RESERVED_NAMES: [&str; 1] = ["std"];

    /// Comment marker used for generated comments
    pub const COMMENT: &str = "//";

    /// Suffix appended to sanitized panel types to name template functions
    pub const TEMPLATE_SUFFIX: &str = "Panel";

    /// Name of the trailing override parameter on template functions
    pub const OVERRIDES_PARAM: &str = "overrides";

    /// Base name for extracted common query targets
    pub const COMMON_TARGET_NAME: &str = "commonTarget";
}

/// Messages shared between the pipeline and the command surface
pub mod messages {
    pub const GENERATED_BY: &str = "Generated by grafana2jsonnet from Grafana dashboard JSON";
    pub const VALIDATION_WARNING_PREFIX: &str = "Validation warning: ";
    pub const OUTPUT_EXISTS_PREFIX: &str = "Output file exists: ";
    pub const NON_JSON_EXTENSION: &str = "File extension is not .json: ";
}
