use crate::theme::Palette;
use crate::ui::StyleTokens;
use gtk4::CssProvider;

pub(super) const PALETTE_ROOT_CLASS: &str = "hyprsnipper-palette";
pub(super) const PICKER_ROOT_CLASS: &str = "hyprsnipper-picker";

pub(super) fn palette_css(tokens: StyleTokens, palette: &Palette) -> String {
    format!(
        "
window.{palette_root} {{
  background: transparent;
}}
.{palette_root} .palette-surface {{
  background: {background};
  border-radius: {window_radius}px;
  padding: {spacing_10}px {spacing_12}px;
}}
.{palette_root} button.mode-button {{
  background: {button_bg};
  border: none;
  box-shadow: none;
  margin: 0 {spacing_8}px;
  color: {icon_color};
}}
.{palette_root} button.mode-button:checked {{
  background: {button_checked};
  border-radius: {control_radius}px;
}}
.{palette_root} button.mode-button:hover {{
  background: {button_hover};
}}
.{palette_root} button.mode-button image {{
  color: {icon_color};
}}
.{palette_root} checkbutton.option-check {{
  color: {checkbox_fg};
  font-size: {checkbox_font}px;
  padding: {spacing_2}px {spacing_8}px;
}}
.{palette_root} checkbutton.option-check check {{
  min-width: {indicator}px;
  min-height: {indicator}px;
}}
.{palette_root} checkbutton.option-check label {{
  color: {checkbox_fg};
}}
tooltip {{
  background: {tooltip_bg};
  color: {tooltip_fg};
  border: {border_width}px solid {primary};
  padding: {spacing_6}px {spacing_10}px;
  border-radius: {control_radius}px;
  font-size: {tooltip_font}px;
}}
tooltip label {{
  color: {tooltip_fg};
}}
window.{picker_root} {{
  background: transparent;
}}
",
        palette_root = PALETTE_ROOT_CLASS,
        picker_root = PICKER_ROOT_CLASS,
        background = palette.get("background"),
        primary = palette.get("primary"),
        button_bg = palette.get("button_bg"),
        button_checked = palette.get("button_checked"),
        button_hover = palette.get("button_hover"),
        checkbox_fg = palette.get("checkbox_fg"),
        icon_color = palette.get("icon_color"),
        tooltip_bg = palette.get("tooltip_bg"),
        tooltip_fg = palette.get("tooltip_fg"),
        window_radius = tokens.window_radius,
        control_radius = tokens.control_radius,
        border_width = tokens.border_width,
        checkbox_font = tokens.checkbox_font_px,
        indicator = tokens.checkbox_indicator_px,
        tooltip_font = tokens.tooltip_font_px,
        spacing_2 = tokens.spacing_2,
        spacing_6 = tokens.spacing_6,
        spacing_8 = tokens.spacing_8,
        spacing_10 = tokens.spacing_10,
        spacing_12 = tokens.spacing_12,
    )
}

pub(super) fn install_runtime_css(tokens: StyleTokens, palette: &Palette) {
    let css = palette_css(tokens, palette);
    let provider = CssProvider::new();
    provider.load_from_data(&css);
    if let Some(display) = gtk4::gdk::Display::default() {
        gtk4::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    } else {
        tracing::warn!("no default display; palette styles not installed");
    }
}
