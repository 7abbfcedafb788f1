#![cfg(target_arch = "wasm32")]

use std::{cell::RefCell, rc::Rc};
use trellis_dom::{web::WebDom, Definition, LifecycleState, Props, Runtime};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement};

wasm_bindgen_test_configure!(run_in_browser);

fn body() -> HtmlBodyElement {
	window()
		.unwrap()
		.document()
		.unwrap()
		.body()
		.unwrap()
		.dyn_into::<HtmlBodyElement>()
		.unwrap()
}

#[wasm_bindgen_test]
fn mount_nested_and_update() {
	tracing_wasm::set_as_global_default();

	let runtime = Runtime::new(WebDom::from_window().unwrap());
	runtime
		.add(Definition::new("WebFoo").style(|| "div { color: red; }").render(|_| Ok(r#"<div class="web-foo"></div>"#.to_owned())))
		.unwrap();
	runtime
		.add(Definition::new("WebBar").render(|cx| {
			Ok(format!(
				r#"<p>{}</p><web-foo></web-foo><web-foo></web-foo>"#,
				cx.props().text("label").unwrap_or_default()
			))
		}))
		.unwrap();

	let body = body();
	body.set_inner_html(r#"<web-bar id="bar" label="first"></web-bar>"#);

	let document = runtime.dom().document();
	assert_eq!(document.get_elements_by_class_name("web-foo").length(), 2);
	assert_eq!(runtime.refs().len(), 3);

	let host: web_sys::Node = document.get_element_by_id("bar").unwrap().into();
	runtime.set_props(&host, Props::from_iter([("label", "second")])).unwrap();
	assert_eq!(document.query_selector("#bar > p").unwrap().unwrap().text_content().unwrap(), "second");
	assert_eq!(runtime.refs().len(), 3);

	let styles = document.head().unwrap().get_elements_by_tag_name("style");
	assert_eq!(styles.length(), 1);
	assert_eq!(styles.item(0).unwrap().text_content().unwrap(), "web-foo div { color: red; }");

	body.set_inner_html("");
	assert!(runtime.refs().is_empty());

	let constructed = runtime.construct("web-bar", Props::from_iter([("label", "api")])).unwrap();
	assert_eq!(runtime.state(&constructed), Some(LifecycleState::Constructed));
	assert!(runtime.component(&constructed).is_none());
	body.append_child(&constructed).unwrap();
	assert_eq!(runtime.component(&constructed).unwrap().get_props().unwrap().text("label").unwrap(), "api");
}

#[wasm_bindgen_test]
fn replaced_content_is_swapped_in_one_step() {
	let runtime = Runtime::new(WebDom::from_window().unwrap());
	let seen = Rc::new(RefCell::new(Vec::new()));
	runtime
		.add(
			Definition::new("WebItem")
				.disconnected({
					let seen = Rc::clone(&seen);
					move |_| {
						if let Some(list) = window().unwrap().document().unwrap().get_element_by_id("list") {
							seen.borrow_mut().push(list.child_element_count());
						}
						Ok(())
					}
				})
				.render(|_| Ok("<i></i>".to_owned())),
		)
		.unwrap();
	runtime
		.add(Definition::new("WebList").render(|_| Ok("<p></p><web-item></web-item><web-item></web-item>".to_owned())))
		.unwrap();

	let body = body();
	body.set_inner_html(r#"<web-list id="list"></web-list>"#);
	let host: web_sys::Node = runtime.dom().document().get_element_by_id("list").unwrap().into();
	runtime.set_props(&host, Props::new()).unwrap();

	// Every hook ran after the new content was in place.
	assert_eq!(*seen.borrow(), [3, 3]);
	body.set_inner_html("");
}
