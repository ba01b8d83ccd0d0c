// SPDX-License-Identifier: MIT

//! Process/Thread Attribute List.
//! Because much of windows requires explicit add/remove actions,
//! wrapping it in a single struct that implements Drop will make code maintenance easier.

use windows::Win32::{
    Foundation::{ERROR_INSUFFICIENT_BUFFER, GetLastError, HANDLE},
    System::Threading,
};

pub trait ThreadAttribute {
    fn lp_value(&self) -> *const core::ffi::c_void;
    fn attribute(&self) -> usize;
    fn cb_size(&self) -> usize;
}

/// Creates the new process as if the given process had launched it.
/// The handle needs `PROCESS_CREATE_PROCESS` access.
pub struct ParentProcess(pub HANDLE);

impl ThreadAttribute for ParentProcess {
    // The attribute value is a pointer to the handle, not the handle itself.
    fn lp_value(&self) -> *const core::ffi::c_void {
        (&self.0 as *const HANDLE).cast()
    }

    fn attribute(&self) -> usize {
        Threading::PROC_THREAD_ATTRIBUTE_PARENT_PROCESS as usize
    }

    fn cb_size(&self) -> usize {
        std::mem::size_of::<HANDLE>()
    }
}

pub struct ThreadAttributeList {
    // The attribute values are boxed so the pointers handed to
    // UpdateProcThreadAttribute stay put until the list is deleted.
    _attributes: Vec<Box<dyn ThreadAttribute>>,
    // attr_buf contains the actual buffer that the attribute list uses.  It must be
    // maintained in the structure to ensure the memory is not freed while the attribute list is in use.
    _attr_buf: Vec<u8>,
    attr_list: Option<Threading::LPPROC_THREAD_ATTRIBUTE_LIST>,
}

impl ThreadAttributeList {
    pub fn new(attributes: Vec<Box<dyn ThreadAttribute>>) -> windows::core::Result<Self> {
        unsafe {
            // Get the expected size.
            // This should return an error, which should indicate insufficient buffer size, which, yes,
            // we passed a 0 size to get the size.  It's weird semantics.
            let mut attr_size: usize = 0;
            if let Err(e) = Threading::InitializeProcThreadAttributeList(
                None,                    // query buffer size
                attributes.len() as u32, // number of attributes to set
                Some(0),                 // must be 0
                &mut attr_size,          // output required size in bytes
            ) {
                if GetLastError() != ERROR_INSUFFICIENT_BUFFER {
                    return Err(e);
                }
            }

            let mut attr_buf = vec![0u8; attr_size];
            let attr_list = Threading::LPPROC_THREAD_ATTRIBUTE_LIST(attr_buf.as_mut_ptr().cast::<_>());
            Threading::InitializeProcThreadAttributeList(
                Some(attr_list),
                attributes.len() as u32,
                Some(0),
                &mut attr_size,
            )?;
            // From here on Drop deletes the list, even if an update fails.
            let mut list = Self {
                _attributes: vec![],
                _attr_buf: attr_buf,
                attr_list: Some(attr_list),
            };

            for attr in &attributes {
                Threading::UpdateProcThreadAttribute(
                    attr_list,
                    0, // dwFlags must be 0
                    attr.attribute(),
                    Some(attr.lp_value()),
                    attr.cb_size(),
                    None, // don't care about the previous value of this attribute.
                    None,
                )?;
            }

            list._attributes = attributes;
            Ok(list)
        }
    }

    pub fn list(&self) -> Option<Threading::LPPROC_THREAD_ATTRIBUTE_LIST> {
        self.attr_list
    }
}

impl Drop for ThreadAttributeList {
    fn drop(&mut self) {
        if let Some(list) = self.attr_list.take() {
            let _ = unsafe { Threading::DeleteProcThreadAttributeList(list) };
        }
    }
}
