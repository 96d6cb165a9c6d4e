#![cfg(target_arch = "wasm32")]

use dom_mirror::{web::WebHost, Collection, ElementOptions, Node};
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, HtmlBodyElement, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

static mut LOG_INITIALIZED: bool = false;

#[wasm_bindgen_test]
fn click() {
	unsafe {
		if !LOG_INITIALIZED {
			//TODO: Fail on Warnig or Error.
			tracing_wasm::set_as_global_default();
			LOG_INITIALIZED = true;
		}
	}

	let body = window().unwrap().document().unwrap().body().unwrap().dyn_into::<HtmlBodyElement>().unwrap();
	let host = WebHost::new().unwrap();

	let click_count = Rc::new(RefCell::new(0));
	let callback = Closure::wrap(Box::new({
		let click_count = Rc::clone(&click_count);
		move |event: web_sys::Event| {
			assert_eq!(event.type_(), "click");
			*click_count.borrow_mut() += 1;
		}
	}) as Box<dyn FnMut(web_sys::Event)>);
	let listener = callback.as_ref().unchecked_ref::<js_sys::Function>();

	let mut buttons = Collection::new();
	for id in &["test-button-1", "test-button-2"] {
		buttons.add(Node::create(&host, "BUTTON", ElementOptions::new().attribute("id", *id)).unwrap());
	}
	buttons.insert_into(&web_sys::Element::from(body)).unwrap().on("click", listener).unwrap();

	assert_eq!(*click_count.borrow(), 0);
	for node in &buttons {
		node.live().dyn_ref::<HtmlElement>().unwrap().click();
	}
	assert_eq!(*click_count.borrow(), 2);

	buttons.off("click", listener).unwrap();
	for node in &buttons {
		node.live().dyn_ref::<HtmlElement>().unwrap().click();
	}
	assert_eq!(*click_count.borrow(), 2);

	buttons.each(|node, _| drop(node.unbind_from_dom()), true);
}
