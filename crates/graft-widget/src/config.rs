use serde::Serialize;

/// Well-known id/class of the container element the widget renders into.
pub const CONTAINER_ID: &str = "jupiter-plugin-instance";

pub const DEFAULT_INITIAL_AMOUNT: &str = "100000000";

/// USDC mint, the fixed reference input token.
pub const DEFAULT_INPUT_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

const EXACT_IN: &str = "ExactIn";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub display_mode: String,
    pub widget_style: WidgetStyle,
    pub form_props: FormProps,
    pub container_class_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetStyle {
    pub position: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormProps {
    pub initial_amount: String,
    pub initial_input_mint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swap_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_output_mint: Option<String>,
}

impl WidgetConfig {
    /// Base config is fixed; a detected token address additionally pins an
    /// exact-input swap towards that token.
    pub fn for_token(token_address: Option<&str>) -> Self {
        let mut form_props = FormProps {
            initial_amount: DEFAULT_INITIAL_AMOUNT.to_string(),
            initial_input_mint: DEFAULT_INPUT_MINT.to_string(),
            swap_mode: None,
            initial_output_mint: None,
        };
        if let Some(address) = token_address {
            form_props.swap_mode = Some(EXACT_IN.to_string());
            form_props.initial_output_mint = Some(address.to_string());
        }
        Self {
            display_mode: "widget".to_string(),
            widget_style: WidgetStyle {
                position: "bottom-left".to_string(),
            },
            form_props,
            container_class_name: CONTAINER_ID.to_string(),
        }
    }
}
